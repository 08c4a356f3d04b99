#![allow(clippy::expect_used, clippy::unwrap_used)]

use herald_rules::{RuleConfig, RuleError, RuleSet, RuleSource, RuleStore, unique_targets};
use pretty_assertions::assert_eq;

const RULES: &str = r#"[
    (name: "urgent", keywords: ["urgent", "asap"], target_chat_ids: [-100111, -100222]),
    (name: "tech", keywords: ["Rust"], target_chat_ids: [-100111, -100333], case_sensitive: true),
]"#;

fn load(source: &str) -> Result<RuleSet, RuleError> {
    let configs: Vec<RuleConfig> = ron::from_str(source).expect("rules parse");
    RuleSet::from_configs(configs)
}

#[test]
fn rules_from_ron() {
    let set = load(RULES).expect("valid rules");

    assert_eq!(set.len(), 2);
    assert!(!set.rules()[0].case_sensitive());
    assert!(set.rules()[1].case_sensitive());
}

#[test]
fn overlapping_rules_resolve_to_unique_destinations() {
    let set = load(RULES).expect("valid rules");

    let matches = set.match_text("ASAP: Rust 2.0 released");
    let names: Vec<_> = matches.iter().map(|m| m.rule_name.as_str()).collect();
    assert_eq!(names, ["urgent", "tech"]);
    assert_eq!(matches[0].matched_keyword, "asap");
    assert_eq!(unique_targets(&matches), [-100_111, -100_222, -100_333]);
}

#[test]
fn invalid_rule_names_its_defect() {
    let err = load(r#"[(name: "empty", keywords: [], target_chat_ids: [1])]"#).unwrap_err();
    assert_eq!(err.to_string(), "Rule 'empty' has no keywords");
}

#[test]
fn store_serves_replaced_rules() {
    let store = RuleStore::new(load(RULES).expect("valid rules"));
    assert_eq!(store.snapshot().match_text("urgent").len(), 1);

    store.replace(load(r#"[(name: "other", keywords: ["x"], target_chat_ids: [5])]"#).unwrap());
    assert!(store.snapshot().match_text("urgent").is_empty());
    assert_eq!(store.snapshot().match_text("x")[0].target_chat_ids, [5]);
}
