use std::sync::Arc;

use chrono::NaiveDate;

use nextup::config::Config;
use nextup::core::router::{EventRouter, ResponseData};
use nextup::core::storage::Storage;
use nextup::core::types::{GamificationState, Priority, XpAction};
use nextup::llm::DisabledBackend;
use nextup::observability::{NoopObserver, ObserverEvent};

use super::pipeline_harness::{Harness, StateWriteFails, USER, complete_task};

async fn complete(harness: &Harness, ts: &str, priority: Priority) -> (GamificationState, u32, bool) {
    let response = harness.router.process_event(complete_task(ts, priority)).await;
    match response.data {
        Some(ResponseData::Progress {
            state,
            xp_awarded,
            leveled_up,
        }) => (state, xp_awarded, leveled_up),
        other => panic!("expected progress, got {other:?}"),
    }
}

#[tokio::test]
async fn first_high_priority_completion() {
    let harness = Harness::disabled();
    let (state, xp, leveled_up) = complete(&harness, "2024-01-01T10:00:00Z", Priority::High).await;

    assert_eq!(xp, 20);
    assert_eq!(state.total_xp, 20);
    assert_eq!(state.level, 1);
    assert_eq!(state.current_streak, 1);
    assert_eq!(state.longest_streak, 1);
    assert!(!leveled_up);

    let transactions = harness.storage.transactions(USER);
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].xp_delta, 20);
    assert_eq!(
        transactions[0].occurred_on,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    );
}

#[tokio::test]
async fn streak_increments_then_resets_after_gap() {
    let harness = Harness::disabled();
    complete(&harness, "2024-01-01T10:00:00Z", Priority::Low).await;
    let (state, ..) = complete(&harness, "2024-01-02T10:00:00Z", Priority::Low).await;
    assert_eq!(state.current_streak, 2);

    let (state, ..) = complete(&harness, "2024-01-02T18:00:00Z", Priority::Low).await;
    assert_eq!(state.current_streak, 2);

    let (state, ..) = complete(&harness, "2024-01-05T10:00:00Z", Priority::Low).await;
    assert_eq!(state.current_streak, 1);
    assert_eq!(state.longest_streak, 2);
    assert_eq!(harness.storage.transactions(USER).len(), 4);
}

#[tokio::test]
async fn back_dated_completion_keeps_streak() {
    let harness = Harness::disabled();
    complete(&harness, "2024-01-10T10:00:00Z", Priority::Medium).await;
    let (state, xp, _) = complete(&harness, "2024-01-08T10:00:00Z", Priority::Medium).await;

    assert_eq!(xp, 15);
    assert_eq!(state.total_xp, 30);
    assert_eq!(state.current_streak, 1);
    assert_eq!(
        state.last_activity_date,
        NaiveDate::from_ymd_opt(2024, 1, 10)
    );
}

#[tokio::test]
async fn crossing_a_threshold_levels_up() {
    let harness = Harness::disabled();
    let mut leveled = Vec::new();
    for _ in 0..5 {
        let (state, _, leveled_up) =
            complete(&harness, "2024-01-01T10:00:00Z", Priority::Urgent).await;
        leveled.push((state.total_xp, state.level, leveled_up));
    }

    assert_eq!(leveled[3], (80, 1, false));
    assert_eq!(leveled[4], (100, 2, true));
    assert!(harness.observer.events().iter().any(|e| matches!(
        e,
        ObserverEvent::XpUpdated {
            level: 2,
            leveled_up: true,
            ..
        }
    )));
}

#[tokio::test]
async fn session_xp_brackets() {
    for (minutes, expected) in [(30, 5), (31, 10), (90, 10), (91, 15)] {
        let harness = Harness::disabled();
        let response = harness
            .router
            .process_event(nextup::core::router::Event::new(
                USER,
                "2024-01-01T10:00:00Z".parse().unwrap(),
                nextup::core::router::EventKind::DoAction {
                    action: XpAction::SessionCompleted {
                        duration_minutes: minutes,
                    },
                },
            ))
            .await;
        let Some(ResponseData::Progress { xp_awarded, .. }) = response.data else {
            panic!("expected progress");
        };
        assert_eq!(xp_awarded, expected, "{minutes} minutes");
    }
}

#[tokio::test]
async fn failed_state_write_keeps_transaction() {
    let storage = Arc::new(StateWriteFails::default());
    let router = EventRouter::new(
        storage.clone(),
        Arc::new(DisabledBackend),
        Arc::new(NoopObserver),
        &Config::default(),
    )
    .unwrap();

    let response = router
        .process_event(complete_task("2024-01-01T10:00:00Z", Priority::High))
        .await;
    assert_eq!(response.error_code(), Some("storage_unavailable"));

    let transactions = storage.inner.transactions(USER);
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].xp_delta, 20);
    assert!(
        storage
            .inner
            .get_gamification_state(USER)
            .await
            .unwrap()
            .is_none()
    );
}
