use std::sync::Arc;

use nextup::config::Config;
use nextup::core::coaching::MotivationStyle;
use nextup::core::router::{Event, EventKind, EventResponse, ResponseData};
use nextup::core::types::{GamificationState, MotivationCategory, MotivationOutput, UserProfile};
use nextup::llm::ScriptedBackend;

use super::pipeline_harness::{Harness, USER, at};

fn motivation(response: EventResponse) -> (MotivationOutput, GamificationState) {
    match response.data {
        Some(ResponseData::Motivation {
            motivation,
            gamification,
        }) => (motivation, gamification),
        other => panic!("expected motivation, got {other:?}"),
    }
}

fn app_open(context: Option<&str>) -> Event {
    Event::new(
        USER,
        at("2024-03-01T08:00:00Z"),
        EventKind::AppOpen {
            context: context.map(str::to_string),
        },
    )
}

fn day_end(completed: u32, planned: u32, reflection: Option<&str>) -> Event {
    Event::new(
        USER,
        at("2024-03-01T21:00:00Z"),
        EventKind::DayEnd {
            completed,
            planned,
            reflection: reflection.map(str::to_string),
        },
    )
}

fn seed_streak(harness: &Harness, streak: u32) {
    harness.storage.seed_state(GamificationState {
        current_streak: streak,
        longest_streak: streak,
        total_xp: 150,
        level: 2,
        ..GamificationState::new(USER)
    });
}

#[tokio::test]
async fn new_user_gets_fresh_start() {
    let harness = Harness::disabled();
    let (output, state) = motivation(harness.router.process_event(app_open(None)).await);

    assert_eq!(output.category, MotivationCategory::FreshStart);
    assert!(output.is_fallback);
    assert!(output.message.contains("level 1"));
    assert_eq!(state, GamificationState::new(USER));
}

#[tokio::test]
async fn long_streak_is_celebrated_with_generated_text() {
    let (harness, backend) =
        Harness::scripted(&[r#"{"message":"Seven days straight. Keep the chain alive!"}"#]);
    seed_streak(&harness, 7);

    let (output, _) = motivation(harness.router.process_event(app_open(Some("stuck"))).await);
    assert_eq!(output.category, MotivationCategory::StreakCelebration);
    assert!(!output.is_fallback);
    assert_eq!(output.message, "Seven days straight. Keep the chain alive!");
    assert!(backend.prompts()[0].contains("streak_celebration"));
}

#[tokio::test]
async fn over_long_text_falls_back_to_template() {
    let long = format!(r#"{{"message":"{}"}}"#, "go ".repeat(60));
    let (harness, _) = Harness::scripted(&[long.as_str()]);
    seed_streak(&harness, 4);

    let (output, _) = motivation(harness.router.process_event(app_open(None)).await);
    assert_eq!(output.category, MotivationCategory::MomentumBuilding);
    assert!(output.is_fallback);
    assert!(output.message.contains("4-day streak"));
    assert_eq!(harness.observer.fallback_stages(), vec!["motivation"]);
}

#[tokio::test]
async fn profile_completion_rate_drives_greeting() {
    let harness = Harness::disabled();
    harness.storage.seed_profile(
        USER,
        UserProfile {
            recent_completion_rate: Some(0.9),
            ..UserProfile::default()
        },
    );
    let (output, _) = motivation(harness.router.process_event(app_open(None)).await);
    assert_eq!(output.category, MotivationCategory::HighAchiever);
}

#[tokio::test]
async fn day_end_categories() {
    let harness = Harness::disabled();

    let (output, _) = motivation(harness.router.process_event(day_end(4, 5, None)).await);
    assert_eq!(output.category, MotivationCategory::HighAchiever);

    let (output, _) = motivation(
        harness
            .router
            .process_event(day_end(1, 5, Some("Struggling with the tax forms")))
            .await,
    );
    assert_eq!(output.category, MotivationCategory::OvercomingChallenge);

    let (output, _) = motivation(harness.router.process_event(day_end(1, 5, None)).await);
    assert_eq!(output.category, MotivationCategory::DailyReflection);

    let snapshots = harness.storage.snapshots(USER);
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots.iter().all(|s| s.tag == "day_end"));
    assert_eq!(snapshots[0].data["completion_rate"], 0.8);
}

fn long_reply() -> String {
    let message = "Solid day. ".repeat(20);
    assert!((151..=300).contains(&message.trim_end().chars().count()));
    format!(r#"{{"message":"{}"}}"#, message.trim_end())
}

#[tokio::test]
async fn day_end_allows_full_length_text() {
    let reply = long_reply();
    let (harness, _) = Harness::scripted(&[reply.as_str()]);

    let (output, _) = motivation(harness.router.process_event(day_end(2, 5, None)).await);
    assert!(!output.is_fallback);
    assert!(output.message.chars().count() > 150);
}

#[tokio::test]
async fn app_open_keeps_brief_limit_unless_configured() {
    let reply = long_reply();
    let (harness, _) = Harness::scripted(&[reply.as_str()]);
    let (output, _) = motivation(harness.router.process_event(app_open(None)).await);
    assert!(output.is_fallback);

    let mut config = Config::default();
    config.generation.app_open_style = MotivationStyle::Full;
    let backend = Arc::new(ScriptedBackend::with_texts([reply.as_str()]));
    let harness = Harness::with_config(backend, &config);
    let (output, _) = motivation(harness.router.process_event(app_open(None)).await);
    assert!(!output.is_fallback);
    assert!(output.message.chars().count() > 150);
}
