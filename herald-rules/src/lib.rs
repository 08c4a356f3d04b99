//! Keyword rules for the herald relay
//!
//! This crate provides:
//! - Validated, immutable [`Rule`]s and ordered [`RuleSet`] snapshots
//! - The rule engine ([`match_rules`]), which reports the first matching
//!   keyword of every matching rule
//! - The destination resolver ([`unique_targets`])
//! - A hot-swappable [`RuleStore`] read through the [`RuleSource`] seam

pub mod chat;
pub mod engine;
mod error;
pub mod rule;
pub mod store;
pub mod targets;

pub use chat::normalize_chat_id;
pub use engine::{MatchResult, match_rules};
pub use error::RuleError;
pub use rule::{Rule, RuleConfig};
pub use store::{RuleSet, RuleSource, RuleStore};
pub use targets::unique_targets;
