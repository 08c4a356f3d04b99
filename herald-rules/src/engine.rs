//! Rule evaluation.

use std::cell::OnceCell;

use herald_common::ChatId;

use crate::rule::Rule;

/// A rule that matched one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub rule_name: String,
    /// The first keyword of the rule found in the text, in its compared form
    /// (lowercased for case-insensitive rules)
    pub matched_keyword: String,
    pub target_chat_ids: Vec<ChatId>,
}

/// Evaluate `text` against `rules`, in declaration order.
///
/// Each rule contributes at most one [`MatchResult`]: keywords are tried in
/// declaration order and the first one contained in the text wins. Text is
/// lowercased for rules that are not case sensitive; the lowercased copy is
/// built at most once per call.
pub fn match_rules<'a, I>(text: &str, rules: I) -> Vec<MatchResult>
where
    I: IntoIterator<Item = &'a Rule>,
{
    if text.is_empty() {
        return Vec::new();
    }

    let lowered = OnceCell::new();

    rules
        .into_iter()
        .filter_map(|rule| {
            let haystack = if rule.case_sensitive() {
                text
            } else {
                lowered.get_or_init(|| text.to_lowercase()).as_str()
            };

            rule.first_match(haystack).map(|keyword| MatchResult {
                rule_name: rule.name().to_string(),
                matched_keyword: keyword.to_string(),
                target_chat_ids: rule.target_chat_ids().to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn rule(name: &str, keywords: &[&str], targets: &[ChatId], case_sensitive: bool) -> Rule {
        Rule::new(
            name,
            keywords.iter().map(ToString::to_string).collect(),
            targets.to_vec(),
            case_sensitive,
        )
        .expect("valid rule")
    }

    #[test]
    fn test_simple_match() {
        let rules = [rule("r1", &["test", "hello"], &[-100], false)];

        let matched = match_rules("This is a test message", &rules);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].rule_name, "r1");
        assert_eq!(matched[0].matched_keyword, "test");

        assert!(match_rules("Another message", &rules).is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        let rules = [rule("r1", &["Test"], &[-100], true)];

        assert!(match_rules("this is a test", &rules).is_empty());
        assert_eq!(match_rules("this is a Test", &rules).len(), 1);
    }

    #[test]
    fn test_first_keyword_wins() {
        let rules = [rule("r1", &["news", "urgent"], &[-100], false)];

        let matched = match_rules("urgent news", &rules);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].matched_keyword, "news");
    }

    #[test]
    fn test_empty_inputs() {
        let rules = [rule("r1", &["a"], &[-100], false)];
        assert!(match_rules("", &rules).is_empty());
        assert!(match_rules("anything", &Vec::<Rule>::new()).is_empty());
    }

    #[test]
    fn test_urgent_scenario() {
        let rules = [rule("urgent", &["urgent"], &[-100_111, -100_222], false)];

        let matched = match_rules("this is Urgent news", &rules);
        assert_eq!(
            matched,
            vec![MatchResult {
                rule_name: "urgent".to_string(),
                matched_keyword: "urgent".to_string(),
                target_chat_ids: vec![-100_111, -100_222],
            }]
        );
    }

    #[test]
    fn test_rules_reported_in_declaration_order() {
        let rules = [
            rule("b", &["x"], &[2], false),
            rule("a", &["x"], &[1], true),
            rule("c", &["zzz"], &[3], false),
        ];

        let names: Vec<_> = match_rules("x marks the spot", &rules)
            .into_iter()
            .map(|m| m.rule_name)
            .collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_repeated_evaluation_is_identical() {
        let rules = [
            rule("a", &["alpha", "beta"], &[1, 2], false),
            rule("b", &["Beta"], &[2, 3], true),
        ];
        let text = "Alpha and Beta";

        let first = match_rules(text, &rules);
        for _ in 0..10 {
            assert_eq!(match_rules(text, &rules), first);
        }
    }
}
