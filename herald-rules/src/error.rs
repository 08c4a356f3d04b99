//! Error types for rule construction.

use herald_common::ChatId;
use thiserror::Error;

/// A rule (or rule set) failed validation.
///
/// Every variant names the offending rule so a configuration diagnostic can
/// point straight at it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule has an empty name.
    #[error("Rule name cannot be empty")]
    EmptyName,

    /// The rule lists no keywords.
    #[error("Rule '{rule}' has no keywords")]
    NoKeywords { rule: String },

    /// One of the keywords is empty or only whitespace.
    #[error("Rule '{rule}' has an empty keyword at position {index}")]
    EmptyKeyword { rule: String, index: usize },

    /// The rule lists no destination chats.
    #[error("Rule '{rule}' has no target chats")]
    NoTargets { rule: String },

    /// A destination chat appears more than once.
    #[error("Rule '{rule}' lists target chat {chat_id} more than once")]
    DuplicateTarget { rule: String, chat_id: ChatId },

    /// Two rules in the same set share a name.
    #[error("Rule name '{rule}' is used more than once")]
    DuplicateName { rule: String },
}
