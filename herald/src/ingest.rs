//! Producer side of the relay: inbound messages become queue records.

use std::sync::Arc;

use ahash::AHashSet;
use arc_swap::ArcSwap;
use herald_common::{ChatId, ForwardMode, SourceRef, audit, incoming};
use herald_rules::{RuleSource, unique_targets};
use herald_spool::{DurableQueue, NewRecord, RecordId, SpoolError};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// A message observed in some chat
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: i64,
    #[serde(default)]
    pub text: String,
}

/// Matches inbound messages against the current rules and enqueues a record
/// for every message that matched at least one of them.
///
/// Enqueueing never waits on delivery; the worker picks records up from the
/// queue on its own schedule.
pub struct Ingestor {
    rules: Arc<dyn RuleSource>,
    monitored: ArcSwap<AHashSet<ChatId>>,
    forward_mode: ForwardMode,
    queue: DurableQueue,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("rules", &self.rules.snapshot().len())
            .field("monitored", &self.monitored.load().len())
            .field("forward_mode", &self.forward_mode)
            .field("queue", &self.queue)
            .finish()
    }
}

impl Ingestor {
    pub fn new(
        rules: Arc<dyn RuleSource>,
        monitored: AHashSet<ChatId>,
        forward_mode: ForwardMode,
        queue: DurableQueue,
    ) -> Self {
        Self {
            rules,
            monitored: ArcSwap::from_pointee(monitored),
            forward_mode,
            queue,
        }
    }

    /// Replace the set of monitored chats
    pub fn set_monitored(&self, monitored: AHashSet<ChatId>) {
        self.monitored.store(Arc::new(monitored));
    }

    pub fn is_monitored(&self, chat_id: ChatId) -> bool {
        self.monitored.load().contains(&chat_id)
    }

    /// Match `message` and enqueue it if any rule matched.
    ///
    /// Messages from chats that are not monitored, and messages without
    /// text, are ignored. Returns the id of the new record, if one was
    /// created.
    ///
    /// # Errors
    /// If the record could not be persisted.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(chat_id = message.chat_id, message_id = message.message_id)
    )]
    pub async fn ingest(&self, message: &InboundMessage) -> Result<Option<RecordId>, SpoolError> {
        if !self.is_monitored(message.chat_id) || message.text.is_empty() {
            return Ok(None);
        }

        let rules = self.rules.snapshot();
        let matches = rules.match_text(&message.text);
        if matches.is_empty() {
            return Ok(None);
        }

        let source = SourceRef {
            message_id: message.message_id,
            source_chat_id: message.chat_id,
        };
        let rule_names: Vec<String> = matches.iter().map(|m| m.rule_name.clone()).collect();
        let keywords: Vec<&str> = matches.iter().map(|m| m.matched_keyword.as_str()).collect();

        incoming!(
            level = INFO,
            "Message {source} matched rules {rule_names:?} (keywords: {keywords:?})"
        );

        let record = self
            .queue
            .enqueue(NewRecord {
                source,
                text: message.text.clone(),
                target_chat_ids: unique_targets(&matches),
                matched_rule_names: rule_names,
                forward_mode: self.forward_mode,
            })
            .await?;

        audit::log_record_enqueued(
            &record.id().to_string(),
            &source,
            record.matched_rule_names(),
            record.target_chat_ids().len(),
            record.text(),
        );

        Ok(Some(record.id()))
    }

    /// Ingest newline-delimited JSON messages until `reader` is exhausted.
    ///
    /// Lines that fail to parse or to enqueue are logged and skipped.
    /// Returns the number of records created.
    ///
    /// # Errors
    /// If reading from `reader` fails.
    pub async fn feed<R>(&self, reader: R) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut enqueued = 0;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let message = match serde_json::from_str::<InboundMessage>(line) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping malformed inbound message");
                    continue;
                }
            };

            match self.ingest(&message).await {
                Ok(Some(_)) => enqueued += 1,
                Ok(None) => {}
                Err(err) => tracing::error!(error = %err, "Failed to enqueue inbound message"),
            }
        }

        Ok(enqueued)
    }
}
