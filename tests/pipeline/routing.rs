use std::sync::Arc;

use serde_json::json;

use nextup::config::Config;
use nextup::core::coaching::fallback_coaching;
use nextup::core::router::{Event, EventKind, EventRouter, ResponseData};
use nextup::core::types::{Candidate, Priority, TaskStatus};
use nextup::llm::DisabledBackend;
use nextup::observability::ObserverEvent;
use nextup::utils::text::{char_len, count_sentences};

use super::pipeline_harness::{
    FailingStorage, Harness, RecordingObserver, USER, at, complete_task, do_next, two_tasks,
};

#[tokio::test]
async fn each_event_routes_to_one_handler() {
    let harness = Harness::disabled();
    harness.storage.seed_candidates(USER, two_tasks());

    let events = [
        Event::new(USER, at("2024-03-01T08:00:00Z"), EventKind::AppOpen { context: None }),
        Event::new(
            USER,
            at("2024-03-01T08:05:00Z"),
            EventKind::CheckInSubmitted {
                energy: 6,
                available_minutes: Some(45),
                mode: None,
                mood: None,
                notes: None,
            },
        ),
        do_next("2024-03-01T08:10:00Z", 60),
        complete_task("2024-03-01T09:00:00Z", Priority::Urgent),
        Event::new(
            USER,
            at("2024-03-01T20:00:00Z"),
            EventKind::DayEnd {
                completed: 1,
                planned: 2,
                reflection: None,
            },
        ),
    ];
    for event in events {
        assert!(harness.router.process_event(event).await.success);
    }

    let routed: Vec<(&str, &str)> = harness
        .observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ObserverEvent::EventRouted { event, handler } => Some((event, handler)),
            _ => None,
        })
        .collect();
    assert_eq!(
        routed,
        vec![
            ("app_open", "greeting"),
            ("check_in_submitted", "check_in"),
            ("do_next", "next_task"),
            ("do_action", "progress"),
            ("day_end", "reflection"),
        ]
    );
}

#[tokio::test]
async fn next_task_response_carries_task_and_coaching() {
    let harness = Harness::disabled();
    harness.storage.seed_candidates(USER, two_tasks());

    let response = harness
        .router
        .process_event(do_next("2024-03-01T09:00:00Z", 120))
        .await;
    let Some(ResponseData::NextTask {
        selection,
        task,
        coaching,
    }) = response.data
    else {
        panic!("expected next task");
    };

    assert_eq!(task.id, selection.task_id);
    assert_eq!(coaching, fallback_coaching());
    let len = char_len(&coaching.message);
    assert!((5..=300).contains(&len));
    assert!(count_sentences(&coaching.message) <= 2);
}

#[tokio::test]
async fn coaching_failure_keeps_valid_selection() {
    let (harness, _) = Harness::scripted(&[
        r#"{"task_id":"t1","reason_codes":["quick_win"]}"#,
        r#"{"title":"","message":"","next_step":""}"#,
    ]);
    harness.storage.seed_candidates(USER, two_tasks());

    let response = harness
        .router
        .process_event(do_next("2024-03-01T09:00:00Z", 120))
        .await;
    let Some(ResponseData::NextTask {
        selection,
        coaching,
        ..
    }) = response.data
    else {
        panic!("expected next task");
    };
    assert!(selection.is_valid);
    assert_eq!(coaching, fallback_coaching());
    assert_eq!(harness.observer.fallback_stages(), vec!["coaching"]);
}

#[tokio::test]
async fn avoided_tags_are_filtered_softly() {
    let harness = Harness::disabled();
    harness.storage.seed_candidates(
        USER,
        vec![
            Candidate::new("mail", "Answer email", Priority::Urgent).with_tags(["email"]),
            Candidate::new("read", "Read paper", Priority::Low),
        ],
    );

    let event = |avoid: &[&str]| {
        Event::new(
            USER,
            at("2024-03-01T09:00:00Z"),
            EventKind::DoNext {
                max_minutes: None,
                mode: None,
                energy: None,
                avoid_tags: avoid.iter().map(ToString::to_string).collect(),
                prefer_priority: None,
            },
        )
    };

    let response = harness.router.process_event(event(&["EMAIL"])).await;
    let Some(ResponseData::NextTask { selection, .. }) = response.data else {
        panic!("expected next task");
    };
    assert_eq!(selection.task_id, "read");
    assert!(selection.alt_task_ids.is_empty());

    harness.storage.seed_candidates(
        USER,
        vec![Candidate::new("mail", "Answer email", Priority::Urgent).with_tags(["email"])],
    );
    let response = harness.router.process_event(event(&["email"])).await;
    let Some(ResponseData::NextTask { selection, .. }) = response.data else {
        panic!("expected next task");
    };
    assert_eq!(selection.task_id, "mail");
}

#[tokio::test]
async fn no_open_tasks_is_a_distinct_failure() {
    let harness = Harness::disabled();
    harness.storage.seed_candidates(
        USER,
        vec![Candidate::new("t", "Done already", Priority::High).with_status(TaskStatus::Done)],
    );

    let response = harness
        .router
        .process_event(do_next("2024-03-01T09:00:00Z", 60))
        .await;
    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.error_code(), Some("no_candidates"));
}

#[tokio::test]
async fn storage_outage_is_reported() {
    let observer = Arc::new(RecordingObserver::default());
    let router = EventRouter::new(
        Arc::new(FailingStorage),
        Arc::new(DisabledBackend),
        observer.clone(),
        &Config::default(),
    )
    .unwrap();

    for event in [
        do_next("2024-03-01T09:00:00Z", 60),
        complete_task("2024-03-01T09:00:00Z", Priority::Low),
        Event::new(USER, at("2024-03-01T09:00:00Z"), EventKind::AppOpen { context: None }),
    ] {
        let response = router.process_event(event).await;
        assert!(!response.success);
        assert_eq!(response.error_code(), Some("storage_unavailable"));
    }
    assert!(
        observer
            .events()
            .iter()
            .any(|e| matches!(e, ObserverEvent::Error { component, .. } if component == "next_task"))
    );
}

#[tokio::test]
async fn raw_json_entry_point() {
    let harness = Harness::disabled();

    let unknown = harness
        .router
        .process_value(json!({
            "type": "task_deleted",
            "user_id": USER,
            "timestamp": "2024-03-01T09:00:00Z"
        }))
        .await;
    assert_eq!(unknown.error_code(), Some("unknown_event"));
    assert!(harness.observer.events().iter().any(|e| matches!(
        e,
        ObserverEvent::UnknownEvent { type_name } if type_name == "task_deleted"
    )));
    assert!(
        !harness
            .observer
            .events()
            .iter()
            .any(|e| matches!(e, ObserverEvent::EventRouted { .. }))
    );

    let missing_energy = harness
        .router
        .process_value(json!({
            "type": "check_in_submitted",
            "user_id": USER,
            "timestamp": "2024-03-01T09:00:00Z"
        }))
        .await;
    assert_eq!(missing_energy.error_code(), Some("invalid_event"));

    let ok = harness
        .router
        .process_value(json!({
            "type": "do_action",
            "user_id": USER,
            "timestamp": "2024-03-01T09:00:00Z",
            "action": {"kind": "session_completed", "duration_minutes": 45}
        }))
        .await;
    let Some(ResponseData::Progress { xp_awarded, .. }) = ok.data else {
        panic!("expected progress");
    };
    assert_eq!(xp_awarded, 10);
}
