//! Ingestion and controller behaviour end to end
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{path::Path, sync::Arc};

use ahash::AHashSet;
use herald::{
    controller::Controller,
    ingest::{InboundMessage, Ingestor},
};
use herald_common::{ChatId, ForwardMode, SourceRef};
use herald_delivery::PassOutcome;
use herald_rules::{RuleConfig, RuleSet, RuleSource, RuleStore};
use herald_spool::{DurableQueue, MemoryBackingStore};
use pretty_assertions::assert_eq;

const NEWS: ChatId = -100_123;

fn rule(name: &str, keywords: &[&str], targets: &[ChatId]) -> RuleConfig {
    RuleConfig {
        name: name.to_string(),
        keywords: keywords.iter().map(ToString::to_string).collect(),
        target_chat_ids: targets.to_vec(),
        case_sensitive: false,
    }
}

fn ingestor(rules: Vec<RuleConfig>) -> (Ingestor, DurableQueue, Arc<RuleStore>) {
    let queue = DurableQueue::new(Arc::new(MemoryBackingStore::new()));
    let store = Arc::new(RuleStore::new(
        RuleSet::from_configs(rules).expect("valid rules"),
    ));
    let ingestor = Ingestor::new(
        store.clone(),
        AHashSet::from_iter([NEWS]),
        ForwardMode::Copy,
        queue.clone(),
    );
    (ingestor, queue, store)
}

fn message(chat_id: ChatId, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id,
        message_id: 7,
        text: text.to_string(),
    }
}

#[tokio::test]
async fn matching_message_is_enqueued_once_per_target() {
    let (ingestor, queue, _) = ingestor(vec![rule("urgent", &["urgent"], &[-100_111, -100_222])]);

    let id = ingestor
        .ingest(&message(NEWS, "this is Urgent news"))
        .await
        .unwrap()
        .expect("message matched");

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);

    let record = &pending[0];
    assert_eq!(record.id(), id);
    assert_eq!(record.target_chat_ids(), [-100_111, -100_222]);
    assert!(record.sent_chat_ids().is_empty());
    assert_eq!(record.matched_rule_names(), ["urgent"]);
    assert_eq!(record.text(), "this is Urgent news");
    assert_eq!(record.forward_mode(), ForwardMode::Copy);
    assert_eq!(record.retry_count(), 0);
    assert_eq!(
        record.source(),
        SourceRef {
            message_id: 7,
            source_chat_id: NEWS
        }
    );
}

#[tokio::test]
async fn shared_target_is_listed_once() {
    let (ingestor, queue, _) = ingestor(vec![
        rule("sport", &["goal"], &[-100_999, -100_555]),
        rule("weather", &["rain"], &[-100_999]),
    ]);

    ingestor
        .ingest(&message(NEWS, "late goal in the rain"))
        .await
        .unwrap();
    ingestor
        .ingest(&message(NEWS, "no rain today"))
        .await
        .unwrap();

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(pending[0].target_chat_ids(), [-100_999, -100_555]);
    assert_eq!(pending[0].matched_rule_names(), ["sport", "weather"]);
    assert_eq!(pending[1].target_chat_ids(), [-100_999]);
}

#[tokio::test]
async fn ignored_messages_create_no_record() {
    let (ingestor, queue, _) = ingestor(vec![rule("urgent", &["urgent"], &[-100_111])]);

    assert_eq!(
        ingestor.ingest(&message(-100_456, "urgent")).await.unwrap(),
        None
    );
    assert_eq!(ingestor.ingest(&message(NEWS, "")).await.unwrap(), None);
    assert_eq!(
        ingestor.ingest(&message(NEWS, "nothing here")).await.unwrap(),
        None
    );
    assert!(queue.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn records_keep_arrival_order() {
    let (ingestor, queue, _) = ingestor(vec![rule("urgent", &["urgent"], &[-100_111])]);

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(
            ingestor
                .ingest(&message(NEWS, "urgent"))
                .await
                .unwrap()
                .unwrap(),
        );
    }

    let pending: Vec<_> = queue
        .list_pending()
        .await
        .unwrap()
        .iter()
        .map(herald_spool::QueueRecord::id)
        .collect();
    assert_eq!(pending, ids);
}

#[tokio::test]
async fn replaced_rules_apply_to_later_messages_only() {
    let (ingestor, queue, store) = ingestor(vec![rule("urgent", &["urgent"], &[-100_111])]);

    ingestor.ingest(&message(NEWS, "urgent")).await.unwrap();
    store.replace(RuleSet::from_configs([rule("tech", &["rust"], &[-100_333])]).unwrap());

    assert_eq!(ingestor.ingest(&message(NEWS, "urgent")).await.unwrap(), None);
    ingestor.ingest(&message(NEWS, "Rust")).await.unwrap();

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].target_chat_ids(), [-100_111]);
    assert_eq!(pending[1].target_chat_ids(), [-100_333]);
}

#[tokio::test]
async fn feed_reads_json_lines() {
    let (ingestor, queue, _) = ingestor(vec![rule("urgent", &["urgent"], &[-100_111])]);

    let input = br#"{"chat_id": -100123, "message_id": 1, "text": "urgent"}

not json
{"chat_id": -100123, "message_id": 2, "text": "calm"}
{"chat_id": -100123, "message_id": 3}
{"chat_id": -100123, "message_id": 4, "text": "URGENT again"}
"#;

    let enqueued = ingestor.feed(&input[..]).await.unwrap();

    assert_eq!(enqueued, 2);
    let messages: Vec<_> = queue
        .list_pending()
        .await
        .unwrap()
        .iter()
        .map(|r| r.source().message_id)
        .collect();
    assert_eq!(messages, [1, 4]);
}

fn write_config(dir: &Path, rules: &str) -> std::path::PathBuf {
    let path = dir.join("herald.config.ron");
    let spool = dir.join("spool");
    std::fs::write(
        &path,
        format!(
            r#"Herald (
                spool: File(path: "{}"),
                monitored_chats: [(id: -100123, name: "news"), (id: -100111, name: "loop")],
                rules: {rules},
            )"#,
            spool.display()
        ),
    )
    .unwrap();
    path
}

#[tokio::test]
async fn controller_relays_through_file_spool() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"[(name: "urgent", keywords: ["urgent"], target_chat_ids: [-100111, -100222])]"#,
    );

    let controller = Controller::init(&path).expect("controller starts");
    let ingestor = controller.ingestor();

    assert!(ingestor.is_monitored(NEWS));
    assert!(!ingestor.is_monitored(-100_111));

    ingestor
        .ingest(&message(NEWS, "this is Urgent news"))
        .await
        .unwrap()
        .expect("message matched");
    assert_eq!(
        std::fs::read_dir(dir.path().join("spool/queue"))
            .unwrap()
            .count(),
        1
    );

    assert_eq!(
        controller.worker().run_pass().await.unwrap(),
        PassOutcome::Drained {
            removed: 1,
            quarantined: 0,
            discarded: 0
        }
    );
    assert!(
        controller
            .worker()
            .queue()
            .list_pending()
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn reload_swaps_rules_and_keeps_them_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"[(name: "urgent", keywords: ["urgent"], target_chat_ids: [-100222])]"#,
    );
    let controller = Controller::init(&path).unwrap();
    assert!(controller.ingestor().is_monitored(-100_111));

    write_config(
        dir.path(),
        r#"[(name: "tech", keywords: ["rust"], target_chat_ids: [-100111])]"#,
    );
    controller.reload().expect("valid config");

    let snapshot = controller.rules().snapshot();
    assert_eq!(snapshot.rules()[0].name(), "tech");
    assert!(!controller.ingestor().is_monitored(-100_111));

    write_config(
        dir.path(),
        r#"[(name: "broken", keywords: [], target_chat_ids: [-100111])]"#,
    );
    assert!(controller.reload().is_err());
    assert_eq!(controller.rules().snapshot().rules()[0].name(), "tech");
}

#[test]
fn invalid_config_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"[(name: "dup", keywords: ["a"], target_chat_ids: [-100111, -100111])]"#,
    );

    let err = Controller::init(&path).unwrap_err();
    assert!(err.to_string().contains("dup"), "{err}");
}
