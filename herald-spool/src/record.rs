//! Queue records and their persisted form.

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use herald_common::{ChatId, ForwardMode, SourceRef};
use serde::{Deserialize, Serialize};

use crate::{error::SerializationError, types::RecordId};

/// A matched message that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub source: SourceRef,
    /// Snapshot of the message text at match time
    pub text: String,
    pub target_chat_ids: Vec<ChatId>,
    pub matched_rule_names: Vec<String>,
    pub forward_mode: ForwardMode,
}

/// A stored, pending delivery
///
/// `sent_chat_ids` only ever grows and never holds an id outside
/// `target_chat_ids`; both lists are free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRecord {
    id: RecordId,
    source: SourceRef,
    text: String,
    target_chat_ids: Vec<ChatId>,
    sent_chat_ids: Vec<ChatId>,
    matched_rule_names: Vec<String>,
    forward_mode: ForwardMode,
    created_at: DateTime<Utc>,
    retry_count: u32,
}

impl QueueRecord {
    /// Build the stored form of `draft`. Repeated targets are dropped,
    /// keeping the first occurrence.
    #[must_use]
    pub fn create(id: RecordId, draft: NewRecord, created_at: DateTime<Utc>) -> Self {
        let mut seen = AHashSet::with_capacity(draft.target_chat_ids.len());
        let target_chat_ids = draft
            .target_chat_ids
            .into_iter()
            .filter(|chat_id| seen.insert(*chat_id))
            .collect();

        Self {
            id,
            source: draft.source,
            text: draft.text,
            target_chat_ids,
            sent_chat_ids: Vec::new(),
            matched_rule_names: draft.matched_rule_names,
            forward_mode: draft.forward_mode,
            created_at,
            retry_count: 0,
        }
    }

    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    #[must_use]
    pub const fn source(&self) -> SourceRef {
        self.source
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn target_chat_ids(&self) -> &[ChatId] {
        &self.target_chat_ids
    }

    #[must_use]
    pub fn sent_chat_ids(&self) -> &[ChatId] {
        &self.sent_chat_ids
    }

    #[must_use]
    pub fn matched_rule_names(&self) -> &[String] {
        &self.matched_rule_names
    }

    #[must_use]
    pub const fn forward_mode(&self) -> ForwardMode {
        self.forward_mode
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Targets not yet resolved, in target order
    #[must_use]
    pub fn pending(&self) -> Vec<ChatId> {
        self.target_chat_ids
            .iter()
            .copied()
            .filter(|chat_id| !self.sent_chat_ids.contains(chat_id))
            .collect()
    }

    /// Whether every target has been resolved
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.target_chat_ids
            .iter()
            .all(|chat_id| self.sent_chat_ids.contains(chat_id))
    }

    /// Record `chat_id` as resolved.
    ///
    /// Returns `false` and leaves the record untouched if `chat_id` is not a
    /// target or is already resolved.
    pub fn mark_sent(&mut self, chat_id: ChatId) -> bool {
        if !self.target_chat_ids.contains(&chat_id) || self.sent_chat_ids.contains(&chat_id) {
            return false;
        }

        self.sent_chat_ids.push(chat_id);
        true
    }

    /// Count a delivery pass that stopped early, returning the new count.
    pub const fn record_failure(&mut self) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_count
    }

    /// Milliseconds between creation and `now`
    #[must_use]
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_milliseconds()
    }

    /// Encode the record as its stored JSON document.
    ///
    /// # Errors
    /// If the document cannot be serialized.
    pub fn to_json(&self) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec_pretty(&RecordDocument::from(self))?)
    }

    /// Decode a stored JSON document.
    ///
    /// # Errors
    /// If the document is malformed, or if it lists a target twice or a sent
    /// chat that is not a target.
    pub fn from_json(id: RecordId, bytes: &[u8]) -> Result<Self, SerializationError> {
        let document: RecordDocument = serde_json::from_slice(bytes)?;

        let mut targets = AHashSet::with_capacity(document.target_chat_ids.len());
        if let Some(chat_id) = document
            .target_chat_ids
            .iter()
            .find(|chat_id| !targets.insert(**chat_id))
        {
            return Err(SerializationError::Corrupted(format!(
                "record {id} lists target {chat_id} more than once"
            )));
        }

        let mut sent = AHashSet::with_capacity(document.sent_chat_ids.len());
        if let Some(chat_id) = document
            .sent_chat_ids
            .iter()
            .find(|chat_id| !targets.contains(*chat_id) || !sent.insert(**chat_id))
        {
            return Err(SerializationError::Corrupted(format!(
                "record {id} has unexpected sent chat {chat_id}"
            )));
        }

        Ok(Self {
            id,
            source: SourceRef {
                message_id: document.message_id,
                source_chat_id: document.source_chat_id,
            },
            text: document.text,
            target_chat_ids: document.target_chat_ids,
            sent_chat_ids: document.sent_chat_ids,
            matched_rule_names: document.matched_rule_names,
            forward_mode: document.forward_mode,
            created_at: document.created_at,
            retry_count: document.retry_count,
        })
    }
}

/// The persisted layout of a record. The id lives in the filename.
#[derive(Debug, Serialize, Deserialize)]
struct RecordDocument {
    message_id: i64,
    source_chat_id: ChatId,
    text: String,
    target_chat_ids: Vec<ChatId>,
    #[serde(default)]
    sent_chat_ids: Vec<ChatId>,
    #[serde(default)]
    matched_rule_names: Vec<String>,
    #[serde(default)]
    forward_mode: ForwardMode,
    created_at: DateTime<Utc>,
    #[serde(default)]
    retry_count: u32,
}

impl From<&QueueRecord> for RecordDocument {
    fn from(record: &QueueRecord) -> Self {
        Self {
            message_id: record.source.message_id,
            source_chat_id: record.source.source_chat_id,
            text: record.text.clone(),
            target_chat_ids: record.target_chat_ids.clone(),
            sent_chat_ids: record.sent_chat_ids.clone(),
            matched_rule_names: record.matched_rule_names.clone(),
            forward_mode: record.forward_mode,
            created_at: record.created_at,
            retry_count: record.retry_count,
        }
    }
}
