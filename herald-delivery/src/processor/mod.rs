//! Delivery worker orchestration

mod delivery;
mod pass;

use std::time::Duration;

use herald_common::{Signal, internal};
use herald_spool::DurableQueue;
use serde::Deserialize;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

pub use self::pass::PassOutcome;
use crate::{error::DeliveryError, policy::RetryPolicy, transport::Transport};

const fn default_idle_poll() -> u64 {
    5
}

const fn default_error_backoff() -> u64 {
    10
}

/// Delivery worker settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryConfig {
    /// How long to sleep when the queue is empty (in seconds)
    #[serde(default = "default_idle_poll")]
    pub idle_poll_secs: u64,

    /// How long to sleep after a pass aborted on a spool failure (in seconds)
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    /// Retry ceiling and backoff delays
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            idle_poll_secs: default_idle_poll(),
            error_backoff_secs: default_error_backoff(),
            retry: RetryPolicy::default(),
        }
    }
}

/// The single consumer of a [`DurableQueue`]
///
/// Records are processed oldest first, one destination at a time, and every
/// resolved destination is persisted before the next one is attempted. A
/// crash therefore repeats at most the one attempt that was in flight.
#[derive(Debug)]
pub struct DeliveryWorker<T> {
    config: DeliveryConfig,
    queue: DurableQueue,
    transport: T,
}

impl<T: Transport> DeliveryWorker<T> {
    pub const fn new(config: DeliveryConfig, queue: DurableQueue, transport: T) -> Self {
        Self {
            config,
            queue,
            transport,
        }
    }

    pub const fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    pub const fn queue(&self) -> &DurableQueue {
        &self.queue
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// How long the serve loop sleeps after a pass ends with `outcome`
    fn delay_after(&self, outcome: &PassOutcome) -> Option<Duration> {
        match outcome {
            PassOutcome::Idle => Some(Duration::from_secs(self.config.idle_poll_secs)),
            PassOutcome::Drained { .. } => None,
            PassOutcome::Backoff { delay, .. } => Some(*delay),
        }
    }

    /// Run passes until a shutdown signal arrives
    ///
    /// A pass that has started always runs to completion; the signal is
    /// checked before each pass and raced against every sleep. New records do
    /// not cut a sleep short.
    ///
    /// # Errors
    ///
    /// This currently always returns `Ok`; pass failures are logged and
    /// retried after `error_backoff_secs`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub async fn serve(
        &self,
        mut shutdown: broadcast::Receiver<Signal>,
    ) -> Result<(), DeliveryError> {
        internal!("Delivery worker starting");

        loop {
            match shutdown.try_recv() {
                Ok(Signal::Shutdown | Signal::Finalised) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Empty | TryRecvError::Lagged(_)) => {}
            }

            let delay = match self.run_pass().await {
                Ok(outcome) => {
                    tracing::debug!(?outcome, "Delivery pass finished");
                    self.delay_after(&outcome)
                }
                Err(err) => {
                    tracing::error!(error = %err, "Delivery pass aborted");
                    Some(Duration::from_secs(self.config.error_backoff_secs))
                }
            };

            let Some(delay) = delay else {
                tokio::task::yield_now().await;
                continue;
            };

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown | Signal::Finalised) | Err(RecvError::Closed) => {
                            internal!("Delivery worker received shutdown signal");
                            break;
                        }
                        Err(RecvError::Lagged(_)) => {}
                    }
                }
            }
        }

        internal!("Delivery worker shutdown complete");
        Ok(())
    }
}
