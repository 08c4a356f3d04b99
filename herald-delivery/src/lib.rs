//! Delivery worker for queued records
//!
//! This crate provides:
//! - The [`Transport`] seam to the messaging provider, plus a logging
//!   [`DryRunTransport`]
//! - The delivery error taxonomy, which decides between marking a
//!   destination done, retrying later, or aborting the pass
//! - The [`RetryPolicy`] ceiling and backoff rules
//! - The [`DeliveryWorker`] scan pass and its serve loop

mod error;
pub mod policy;
mod processor;
mod transport;

pub use error::{DeliveryError, PermanentError, SystemError, TemporaryError};
pub use policy::RetryPolicy;
pub use processor::{DeliveryConfig, DeliveryWorker, PassOutcome};
pub use transport::{DryRunTransport, Transport};
