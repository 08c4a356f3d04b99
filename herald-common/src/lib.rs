pub mod audit;
pub mod chat;
pub mod logging;

pub use chat::{ChatId, ForwardMode, SourceRef};
pub use tracing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Finalised,
}
