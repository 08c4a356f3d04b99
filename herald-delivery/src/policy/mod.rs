//! Policy abstractions for delivery operations.
//!
//! - [`RetryPolicy`]: retry ceiling and backoff delays

pub mod retry;

pub use retry::RetryPolicy;
