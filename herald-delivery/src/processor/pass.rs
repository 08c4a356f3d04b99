//! A single scan over the queue

use std::time::Duration;

use herald_spool::RecordId;

use super::{DeliveryWorker, delivery::RecordOutcome};
use crate::{error::DeliveryError, transport::Transport};

/// How a scan pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The queue was empty
    Idle,

    /// Every pending record was completed, quarantined or discarded
    Drained {
        removed: usize,
        quarantined: usize,
        discarded: usize,
    },

    /// A record hit a non-permanent failure and the pass stopped there
    Backoff { delay: Duration, record: RecordId },
}

impl<T: Transport> DeliveryWorker<T> {
    /// Run one pass over the pending records, oldest first.
    ///
    /// Records are handled in turn until one stops on a failure that is not permanent.
    /// Records quarantined along the way do not stop the pass.
    ///
    /// # Errors
    /// If the spool fails. Progress made before the failure is kept.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_pass(&self) -> Result<PassOutcome, DeliveryError> {
        let scan = self.queue.scan_pending().await?;

        if scan.records.is_empty() && scan.discarded == 0 {
            return Ok(PassOutcome::Idle);
        }

        let mut removed = 0;
        let mut quarantined = 0;

        for mut record in scan.records {
            match self.deliver_record(&mut record).await? {
                RecordOutcome::Removed => removed += 1,
                RecordOutcome::Quarantined => quarantined += 1,
                RecordOutcome::Deferred { delay } => {
                    tracing::info!(
                        record_id = %record.id(),
                        retry_count = record.retry_count(),
                        delay_secs = delay.as_secs(),
                        "Backing off before retrying"
                    );
                    return Ok(PassOutcome::Backoff {
                        delay,
                        record: record.id(),
                    });
                }
            }
        }

        Ok(PassOutcome::Drained {
            removed,
            quarantined,
            discarded: scan.discarded,
        })
    }
}
