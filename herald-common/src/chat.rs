//! Identifiers shared by the rule engine, the spool and the delivery worker.

use serde::{Deserialize, Serialize};

/// Identifier of a chat, used both for monitored sources and destinations.
///
/// Channels and supergroups carry the marked `-100…` form.
pub type ChatId = i64;

/// How a matched message is reproduced at its destinations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// Send a new message carrying a snapshot of the original text
    #[default]
    Copy,
    /// Forward the original message, preserving its attribution
    Forward,
}

impl std::fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Forward => f.write_str("forward"),
        }
    }
}

/// Handle back to the message a queue record was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub message_id: i64,
    pub source_chat_id: ChatId,
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source_chat_id, self.message_id)
    }
}
