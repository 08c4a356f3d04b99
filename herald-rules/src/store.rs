//! Rule snapshots and the hot-swappable store that serves them.

use std::sync::Arc;

use ahash::AHashSet;
use arc_swap::ArcSwap;
use herald_common::ChatId;

use crate::{
    engine::{MatchResult, match_rules},
    error::RuleError,
    rule::{Rule, RuleConfig},
};

/// An ordered, immutable set of rules with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// # Errors
    /// Returns [`RuleError::DuplicateName`] if two rules share a name.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut names = AHashSet::with_capacity(rules.len());
        if let Some(rule) = rules.iter().find(|r| !names.insert(r.name())) {
            return Err(RuleError::DuplicateName {
                rule: rule.name().to_string(),
            });
        }

        Ok(Self { rules })
    }

    /// Validate configured rules, keeping their order.
    ///
    /// # Errors
    /// Returns the first [`RuleError`] found.
    pub fn from_configs<I>(configs: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = RuleConfig>,
    {
        let rules = configs
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(rules)
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every chat any rule forwards into
    #[must_use]
    pub fn all_targets(&self) -> AHashSet<ChatId> {
        self.rules
            .iter()
            .flat_map(|r| r.target_chat_ids().iter().copied())
            .collect()
    }

    /// Run the rule engine over this snapshot.
    #[must_use]
    pub fn match_text(&self, text: &str) -> Vec<MatchResult> {
        match_rules(text, &self.rules)
    }
}

/// Read access to the current rules
///
/// Callers take one snapshot per message and evaluate against it, so a
/// concurrent reload never changes the rules halfway through a match.
pub trait RuleSource: Send + Sync {
    fn snapshot(&self) -> Arc<RuleSet>;
}

/// A [`RuleSource`] whose contents can be replaced at runtime
#[derive(Debug, Default)]
pub struct RuleStore {
    current: ArcSwap<RuleSet>,
}

impl RuleStore {
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(rules),
        }
    }

    /// Atomically install a new snapshot, returning the previous one.
    pub fn replace(&self, rules: RuleSet) -> Arc<RuleSet> {
        let previous = self.current.swap(Arc::new(rules));
        tracing::info!(
            previous = previous.len(),
            current = self.current.load().len(),
            "Rule set replaced"
        );
        previous
    }
}

impl RuleSource for RuleStore {
    fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }
}
