//! Validated keyword rules.

use ahash::AHashSet;
use herald_common::ChatId;
use serde::{Deserialize, Serialize};

use crate::{chat::normalize_chat_id, error::RuleError};

/// A named keyword set mapped to one or more destination chats
///
/// Rules are immutable once built; every constructor validates that the rule
/// has a name, at least one non-empty keyword and at least one target, and
/// that no target is listed twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    keywords: Vec<String>,
    /// Keywords in the form they are compared against the message text
    needles: Vec<String>,
    case_sensitive: bool,
    target_chat_ids: Vec<ChatId>,
}

impl Rule {
    /// Build a rule, rejecting it if it is incomplete.
    ///
    /// # Errors
    /// Returns a [`RuleError`] describing the first defect found.
    pub fn new(
        name: impl Into<String>,
        keywords: Vec<String>,
        target_chat_ids: Vec<ChatId>,
        case_sensitive: bool,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RuleError::EmptyName);
        }

        if keywords.is_empty() {
            return Err(RuleError::NoKeywords { rule: name });
        }

        if let Some(index) = keywords.iter().position(String::is_empty) {
            return Err(RuleError::EmptyKeyword { rule: name, index });
        }

        if target_chat_ids.is_empty() {
            return Err(RuleError::NoTargets { rule: name });
        }

        let mut seen = AHashSet::with_capacity(target_chat_ids.len());
        if let Some(&chat_id) = target_chat_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(RuleError::DuplicateTarget {
                rule: name,
                chat_id,
            });
        }

        let needles = if case_sensitive {
            keywords.clone()
        } else {
            keywords.iter().map(|k| k.to_lowercase()).collect()
        };

        Ok(Self {
            name,
            keywords,
            needles,
            case_sensitive,
            target_chat_ids,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keywords as declared
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    #[must_use]
    pub fn target_chat_ids(&self) -> &[ChatId] {
        &self.target_chat_ids
    }

    /// First keyword contained in `text`, in declaration order.
    ///
    /// `text` must already be lowercased when the rule is case-insensitive.
    pub(crate) fn first_match(&self, text: &str) -> Option<&str> {
        self.needles
            .iter()
            .find(|needle| text.contains(needle.as_str()))
            .map(String::as_str)
    }
}

/// A rule as it appears in configuration
///
/// ```ron
/// (name: "urgent", keywords: ["urgent", "asap"], target_chat_ids: [-100111], case_sensitive: false)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub target_chat_ids: Vec<ChatId>,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl TryFrom<RuleConfig> for Rule {
    type Error = RuleError;

    /// Validate a configured rule, restoring channel markers on its targets.
    fn try_from(config: RuleConfig) -> Result<Self, Self::Error> {
        let targets = config
            .target_chat_ids
            .into_iter()
            .map(normalize_chat_id)
            .collect();

        Self::new(config.name, config.keywords, targets, config.case_sensitive)
    }
}

impl From<&Rule> for RuleConfig {
    fn from(rule: &Rule) -> Self {
        Self {
            name: rule.name.clone(),
            keywords: rule.keywords.clone(),
            target_chat_ids: rule.target_chat_ids.clone(),
            case_sensitive: rule.case_sensitive,
        }
    }
}
