//! Delivering one record

use std::time::Duration;

use chrono::Utc;
use herald_common::{ChatId, ForwardMode, audit, outgoing};
use herald_spool::QueueRecord;

use super::DeliveryWorker;
use crate::{error::DeliveryError, transport::Transport};

/// What became of a record after trying its pending destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RecordOutcome {
    Removed,
    Quarantined,
    Deferred { delay: Duration },
}

impl<T: Transport> DeliveryWorker<T> {
    /// Try every pending destination of `record` in target order.
    ///
    /// Successes and permanent failures both resolve the destination and are
    /// persisted straight away. Any other transport failure stops the record:
    /// its retry count is bumped and persisted, and it is either deferred or,
    /// at the ceiling, quarantined. Only spool failures abort the pass.
    pub(super) async fn deliver_record(
        &self,
        record: &mut QueueRecord,
    ) -> Result<RecordOutcome, DeliveryError> {
        for chat_id in record.pending() {
            match self.attempt(record, chat_id).await {
                Ok(()) => {
                    outgoing!(
                        level = DEBUG,
                        "Delivered record {} to {chat_id}",
                        record.id()
                    );
                }
                Err(err) if err.is_permanent() => {
                    tracing::warn!(
                        record_id = %record.id(),
                        chat_id,
                        error = %err,
                        "Giving up on destination"
                    );
                }
                Err(err) => return self.defer(record, chat_id, &err).await,
            }

            record.mark_sent(chat_id);
            self.queue.persist_update(record).await?;
        }

        self.queue.remove(&record.id()).await?;
        audit::log_delivery_success(
            &record.id().to_string(),
            record.sent_chat_ids(),
            record.retry_count(),
            record.age_ms(Utc::now()),
        );

        Ok(RecordOutcome::Removed)
    }

    async fn defer(
        &self,
        record: &mut QueueRecord,
        chat_id: ChatId,
        err: &DeliveryError,
    ) -> Result<RecordOutcome, DeliveryError> {
        let retry_count = record.record_failure();
        self.queue.persist_update(record).await?;

        tracing::warn!(
            record_id = %record.id(),
            chat_id,
            retry_count,
            remaining = self.config.retry.remaining_attempts(retry_count),
            temporary = err.is_temporary(),
            error = %err,
            "Delivery attempt failed"
        );

        if self.config.retry.should_retry(retry_count) {
            return Ok(RecordOutcome::Deferred {
                delay: self.config.retry.backoff(err.retry_after()),
            });
        }

        self.queue.quarantine(&record.id()).await?;
        audit::log_delivery_failure(
            &record.id().to_string(),
            &record.pending(),
            &err.to_string(),
            retry_count,
        );

        Ok(RecordOutcome::Quarantined)
    }

    /// Deliver `record` to one destination.
    ///
    /// Resolves the chat, copies or forwards the message, then sends a
    /// best-effort notice naming the matched rules. A failed notice is
    /// logged and does not affect the result.
    pub(super) async fn attempt(
        &self,
        record: &QueueRecord,
        chat_id: ChatId,
    ) -> Result<(), DeliveryError> {
        let peer = self.transport.resolve(chat_id).await?;

        match record.forward_mode() {
            ForwardMode::Copy => self.transport.deliver_copy(&peer, record.text()).await?,
            ForwardMode::Forward => {
                self.transport
                    .deliver_forward(&peer, record.source())
                    .await?;
            }
        }

        if !record.matched_rule_names().is_empty() {
            let notice = format!("Matched rule: {}", record.matched_rule_names().join(", "));
            if let Err(err) = self.transport.send_notice(&peer, &notice).await {
                tracing::warn!(
                    record_id = %record.id(),
                    chat_id,
                    error = %err,
                    "Failed to send rule notice"
                );
            }
        }

        Ok(())
    }
}
