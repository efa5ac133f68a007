use std::sync::Arc;
use std::time::Duration;

use nextup::config::Config;
use nextup::core::router::ResponseData;
use nextup::core::selection::fallback::FALLBACK_REASON_CODES;
use nextup::core::types::{ReasonCode, SelectionResult};
use nextup::llm::{ScriptedBackend, ScriptedReply};
use nextup::observability::ObserverEvent;

use super::pipeline_harness::{Harness, USER, do_next, two_tasks};

const NOW: &str = "2024-03-01T09:00:00Z";

async fn select(harness: &Harness) -> SelectionResult {
    harness.storage.seed_candidates(USER, two_tasks());
    let response = harness.router.process_event(do_next(NOW, 120)).await;
    match response.data {
        Some(ResponseData::NextTask { selection, .. }) => selection,
        other => panic!("expected next task, got {other:?} / {:?}", response.error),
    }
}

#[tokio::test]
async fn unreachable_backend_picks_urgent_short_task() {
    let harness = Harness::disabled();
    let selection = select(&harness).await;

    assert_eq!(selection.task_id, "t2");
    assert_eq!(selection.alt_task_ids, vec!["t1".to_string()]);
    assert!(!selection.is_valid);
    assert_eq!(selection.reason_codes, FALLBACK_REASON_CODES.to_vec());
}

#[tokio::test]
async fn malformed_replies_fall_back_with_markers() {
    let replies = [
        "not json at all",
        r#"{"reason_codes":["quick_win"]}"#,
        r#"{"task_id":"t404","reason_codes":["quick_win"]}"#,
        r#"{"task_id":"t1","reason_codes":["overdue","quick_win","fits_time","momentum"]}"#,
        r#"{"task_id":"t1","reason_codes":["because"]}"#,
    ];

    for reply in replies {
        let (harness, _) = Harness::scripted(&[reply]);
        let selection = select(&harness).await;
        assert!(!selection.is_valid, "{reply}");
        assert_eq!(
            selection.reason_codes,
            vec![ReasonCode::Fallback, ReasonCode::FallbackDeterministic],
            "{reply}"
        );
        assert_eq!(selection.task_id, "t2", "{reply}");
    }
}

#[tokio::test]
async fn valid_reply_can_override_scoring() {
    let (harness, backend) = Harness::scripted(&[
        r#"{"task_id":"t1","reason_codes":["energy_match","preferred_tag"],"alt_task_ids":["t2","t1"]}"#,
    ]);
    let selection = select(&harness).await;

    assert!(selection.is_valid);
    assert_eq!(selection.task_id, "t1");
    assert_eq!(
        selection.reason_codes,
        vec![ReasonCode::EnergyMatch, ReasonCode::PreferredTag]
    );
    assert_eq!(selection.alt_task_ids, vec!["t2".to_string()]);
    // selection plus coaching
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn slow_backend_hits_deadline() {
    let mut config = Config::default();
    config.generation.timeout_ms = 50;
    let backend = Arc::new(ScriptedBackend::new([ScriptedReply::Delayed(
        Duration::from_secs(5),
        r#"{"task_id":"t1","reason_codes":["quick_win"]}"#.into(),
    )]));
    let harness = Harness::with_config(backend, &config);

    let selection = select(&harness).await;
    assert!(!selection.is_valid);
    assert_eq!(selection.task_id, "t2");

    let reasons: Vec<String> = harness
        .observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ObserverEvent::FallbackUsed {
                stage: "selection",
                reason,
            } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec!["timeout".to_string()]);
}

#[tokio::test]
async fn selection_is_reproducible() {
    let first = select(&Harness::disabled()).await;
    let second = select(&Harness::disabled()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn selection_boundaries_are_observed() {
    let harness = Harness::disabled();
    select(&harness).await;

    let events = harness.observer.events();
    assert!(events.iter().any(|e| matches!(
        e,
        ObserverEvent::SelectionAttempted { candidates: 2, .. }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ObserverEvent::SelectionCompleted { task_id, is_valid: false } if task_id == "t2"
    )));
    assert_eq!(harness.observer.fallback_stages(), vec!["selection", "coaching"]);
}
