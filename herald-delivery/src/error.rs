//! Typed error handling for delivery operations.
//!
//! - Permanent failures: the destination can never accept the message; it is
//!   marked done so the record can complete
//! - Every other failure the transport reports, including a system error on
//!   its side, stops the pass and consumes one of the record's retries
//! - Spool failures in the worker itself abort the pass

use std::time::Duration;

use herald_common::ChatId;
use herald_spool::SpoolError;
use thiserror::Error;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Failure that retrying will not fix.
    #[error("Permanent failure: {0}")]
    Permanent(#[from] PermanentError),

    /// Failure that may clear up on its own.
    #[error("Temporary failure: {0}")]
    Temporary(#[from] TemporaryError),

    /// Failure the transport could not classify. Retried like a temporary one.
    #[error("Unknown failure: {0}")]
    Unknown(String),

    /// Internal failure, in the spool or inside the transport.
    #[error("System error: {0}")]
    System(#[from] SystemError),
}

/// Destination-level failures that should not be retried.
#[derive(Debug, Error)]
pub enum PermanentError {
    /// The destination chat cannot be resolved.
    #[error("Chat {0} cannot be resolved")]
    Unresolvable(ChatId),

    /// The account may not post to the destination.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The destination is not a chat that can receive messages.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// The provider refused the message itself.
    #[error("Message rejected: {0}")]
    MessageRejected(String),
}

/// Failures that should be retried after a delay.
#[derive(Debug, Error)]
pub enum TemporaryError {
    /// The provider asked us to wait before sending again.
    #[error("Rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Could not reach the provider.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The provider is temporarily unavailable.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// System-level errors that indicate internal problems.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The spool failed.
    #[error("Spool error: {0}")]
    Spool(#[from] SpoolError),

    /// Other internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SpoolError> for DeliveryError {
    fn from(error: SpoolError) -> Self {
        Self::System(SystemError::Spool(error))
    }
}

impl DeliveryError {
    /// Returns `true` if this error is temporary and should be retried.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Returns `true` if this error is permanent and should not be retried.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    /// Returns `true` if this is a system error.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// How long the provider asked us to wait, if it said.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Temporary(TemporaryError::RateLimited { retry_after }) => Some(*retry_after),
            _ => None,
        }
    }
}
