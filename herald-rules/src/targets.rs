use ahash::AHashSet;
use herald_common::ChatId;

use crate::engine::MatchResult;

/// Flatten the targets of every match into a list without duplicates.
///
/// Order is first occurrence: match order, then target order within each
/// match. An empty slice of matches yields an empty list.
#[must_use]
pub fn unique_targets(matches: &[MatchResult]) -> Vec<ChatId> {
    let mut seen = AHashSet::new();

    matches
        .iter()
        .flat_map(|m| m.target_chat_ids.iter().copied())
        .filter(|chat_id| seen.insert(*chat_id))
        .collect()
}
