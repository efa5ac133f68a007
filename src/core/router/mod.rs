//! Event dispatch. Each event is routed to exactly one handler, and the
//! handler's result is assembled into an [`EventResponse`].
//!
//! The router holds no per-user state; callers serialize events per user.

pub mod events;
pub mod response;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::config::{Config, SelectionConfig};
use crate::core::coaching::{
    CoachingGenerator, CoachingInput, MotivationGenerator, MotivationRequest, MotivationStyle,
    MotivationTrigger,
};
use crate::core::gamification::GamificationLedger;
use crate::core::selection::fallback::FALLBACK_REASON_CODES;
use crate::core::selection::{SelectorSettings, TaskSelector};
use crate::core::storage::{LearningSnapshot, Storage};
use crate::core::types::{
    Candidate, GamificationState, Mode, Priority, SelectionConstraints, XpAction,
};
use crate::error::NextupError;
use crate::llm::{GenerationSettings, GenerativeBackend};
use crate::observability::{Observer, ObserverEvent};
use crate::prompt::PromptLibrary;

pub use events::{Event, EventKind, HandlerId, route};
pub use response::{ErrorInfo, EventResponse, ResponseData};

pub const SNAPSHOT_CHECK_IN: &str = "check_in";
pub const SNAPSHOT_SELECTION: &str = "selection";
pub const SNAPSHOT_DAY_END: &str = "day_end";

pub struct EventRouter {
    storage: Arc<dyn Storage>,
    observer: Arc<dyn Observer>,
    selector: TaskSelector,
    coach: CoachingGenerator,
    motivator: MotivationGenerator,
    ledger: GamificationLedger,
    defaults: SelectionConfig,
    app_open_style: MotivationStyle,
    day_end_style: MotivationStyle,
}

impl EventRouter {
    pub fn new(
        storage: Arc<dyn Storage>,
        backend: Arc<dyn GenerativeBackend>,
        observer: Arc<dyn Observer>,
        config: &Config,
    ) -> Result<Self, NextupError> {
        let prompts = Arc::new(PromptLibrary::new()?);
        let generation = GenerationSettings::from_config(&config.generation);

        Ok(Self {
            selector: TaskSelector::new(
                backend.clone(),
                prompts.clone(),
                observer.clone(),
                SelectorSettings::from_config(&config.generation, &config.selection),
            ),
            coach: CoachingGenerator::new(
                backend.clone(),
                prompts.clone(),
                observer.clone(),
                generation.clone(),
            ),
            motivator: MotivationGenerator::new(backend, prompts, observer.clone(), generation),
            ledger: GamificationLedger::new(config.level_table()?),
            defaults: config.selection.clone(),
            app_open_style: config.generation.app_open_style,
            day_end_style: config.generation.day_end_style,
            storage,
            observer,
        })
    }

    /// Entry point for raw JSON. Unknown `type` values and malformed payloads
    /// are rejected before any handler runs.
    pub async fn process_value(&self, raw: serde_json::Value) -> EventResponse {
        match self.parse_event(raw) {
            Ok(event) => self.process_event(event).await,
            Err(err) => EventResponse::from(&err),
        }
    }

    fn parse_event(&self, raw: serde_json::Value) -> Result<Event, NextupError> {
        let Some(name) = raw.get("type").and_then(|t| t.as_str()) else {
            return Err(NextupError::InvalidEvent {
                reason: "event has no 'type' field".into(),
            });
        };
        if !EventKind::is_known_type(name) {
            tracing::warn!(event_type = %name, "unknown event type");
            self.observer.record_event(&ObserverEvent::UnknownEvent {
                type_name: name.to_string(),
            });
            return Err(NextupError::UnknownEvent {
                type_name: name.to_string(),
            });
        }
        serde_json::from_value::<Event>(raw).map_err(|err| {
            tracing::warn!("malformed event payload: {err}");
            NextupError::InvalidEvent {
                reason: err.to_string(),
            }
        })
    }

    pub async fn process_event(&self, event: Event) -> EventResponse {
        let handler = route(&event.kind);
        let event_name = event.kind.type_name();
        self.observer.record_event(&ObserverEvent::EventRouted {
            event: event_name,
            handler: handler.into(),
        });
        tracing::debug!(user_id = %event.user_id, event = event_name, %handler, "event routed");

        match self.dispatch(event).await {
            Ok(data) => EventResponse::ok(data),
            Err(err) => {
                tracing::warn!(%handler, code = err.code(), "handler failed: {err}");
                self.observer.record_event(&ObserverEvent::Error {
                    component: handler.to_string(),
                    message: err.to_string(),
                });
                EventResponse::from(&err)
            }
        }
    }

    async fn dispatch(&self, event: Event) -> Result<ResponseData, NextupError> {
        let Event {
            user_id,
            timestamp,
            kind,
        } = event;

        match kind {
            EventKind::AppOpen { context } => self.greet(&user_id, context).await,
            EventKind::CheckInSubmitted {
                energy,
                available_minutes,
                mode,
                mood,
                notes,
            } => {
                let constraints = SelectionConstraints::new(
                    available_minutes.unwrap_or(self.defaults.default_max_minutes),
                    mode.unwrap_or_else(|| Mode::for_energy(energy)),
                    energy,
                );
                let snapshot = LearningSnapshot::new(
                    &user_id,
                    SNAPSHOT_CHECK_IN,
                    json!({
                        "energy": constraints.current_energy,
                        "available_minutes": available_minutes,
                        "mode": constraints.mode,
                        "mood": mood,
                        "notes": notes,
                        "at": timestamp,
                    }),
                );
                self.storage.save_learning_snapshot(&snapshot).await?;
                self.next_task(&user_id, &constraints, timestamp).await
            }
            EventKind::DoNext {
                max_minutes,
                mode,
                energy,
                avoid_tags,
                prefer_priority,
            } => {
                let constraints = self.do_next_constraints(
                    max_minutes,
                    mode,
                    energy,
                    avoid_tags,
                    prefer_priority,
                );
                self.next_task(&user_id, &constraints, timestamp).await
            }
            EventKind::DoAction { action } => self.progress(&user_id, &action, timestamp).await,
            EventKind::DayEnd {
                completed,
                planned,
                reflection,
            } => {
                self.reflect(&user_id, completed, planned, reflection, timestamp)
                    .await
            }
        }
    }

    fn do_next_constraints(
        &self,
        max_minutes: Option<u32>,
        mode: Option<Mode>,
        energy: Option<u8>,
        avoid_tags: Vec<String>,
        prefer_priority: Option<Priority>,
    ) -> SelectionConstraints {
        SelectionConstraints::new(
            max_minutes.unwrap_or(self.defaults.default_max_minutes),
            mode.unwrap_or_default(),
            energy.unwrap_or(self.defaults.default_energy),
        )
        .avoiding(avoid_tags)
        .preferring(prefer_priority)
    }

    async fn load_state(&self, user_id: &str) -> Result<GamificationState, NextupError> {
        Ok(self
            .storage
            .get_gamification_state(user_id)
            .await?
            .unwrap_or_else(|| GamificationState::new(user_id)))
    }

    async fn greet(
        &self,
        user_id: &str,
        context: Option<String>,
    ) -> Result<ResponseData, NextupError> {
        let state = self.load_state(user_id).await?;
        let profile = self.storage.get_user_profile(user_id).await?;

        let request =
            MotivationRequest::new(state.current_streak, state.level, MotivationTrigger::AppOpen)
                .with_completion_rate(profile.recent_completion_rate)
                .with_context(context)
                .with_style(self.app_open_style);
        let motivation = self.motivator.motivate(&request).await;

        Ok(ResponseData::Motivation {
            motivation,
            gamification: state,
        })
    }

    /// Load, filter, select, coach and record the decision.
    async fn next_task(
        &self,
        user_id: &str,
        constraints: &SelectionConstraints,
        now: DateTime<Utc>,
    ) -> Result<ResponseData, NextupError> {
        let candidates = self.storage.get_candidates(user_id).await?;
        let profile = self.storage.get_user_profile(user_id).await?;

        let open: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.status.is_open())
            .collect();
        if open.is_empty() {
            return Err(NextupError::NoCandidates {
                user_id: user_id.to_string(),
            });
        }
        let pool = soft_filter(open, constraints);

        let outcome = self
            .selector
            .select(user_id, &pool, &profile, constraints, now)
            .await?;
        let task = outcome.selected().cloned().ok_or_else(|| {
            anyhow::anyhow!("selected task {} missing from pool", outcome.result.task_id)
        })?;

        let coaching = self
            .coach
            .coach(&CoachingInput {
                task: task.clone(),
                reason_codes: outcome
                    .result
                    .reason_codes
                    .iter()
                    .filter(|code| !FALLBACK_REASON_CODES.contains(code))
                    .copied()
                    .collect(),
                mode: constraints.mode,
            })
            .await;

        let snapshot = LearningSnapshot::new(
            user_id,
            SNAPSHOT_SELECTION,
            json!({
                "task_id": outcome.result.task_id,
                "reason_codes": outcome.result.reason_codes,
                "alt_task_ids": outcome.result.alt_task_ids,
                "is_valid": outcome.result.is_valid,
                "pool_size": pool.len(),
                "constraints": constraints,
                "at": now,
            }),
        );
        self.storage.save_learning_snapshot(&snapshot).await?;

        Ok(ResponseData::NextTask {
            selection: outcome.result,
            task,
            coaching,
        })
    }

    async fn progress(
        &self,
        user_id: &str,
        action: &XpAction,
        now: DateTime<Utc>,
    ) -> Result<ResponseData, NextupError> {
        let update = self
            .ledger
            .record(self.storage.as_ref(), user_id, action, now.date_naive(), now)
            .await?;

        self.observer.record_event(&ObserverEvent::XpUpdated {
            user_id: user_id.to_string(),
            xp_awarded: update.xp_awarded,
            level: update.state.level,
            leveled_up: update.leveled_up,
        });
        if update.leveled_up {
            tracing::info!(user_id, level = update.state.level, "level up");
        }

        Ok(ResponseData::Progress {
            state: update.state,
            xp_awarded: update.xp_awarded,
            leveled_up: update.leveled_up,
        })
    }

    async fn reflect(
        &self,
        user_id: &str,
        completed: u32,
        planned: u32,
        reflection: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ResponseData, NextupError> {
        let state = self.load_state(user_id).await?;
        let completion_rate = (planned > 0).then(|| f64::from(completed) / f64::from(planned));

        let snapshot = LearningSnapshot::new(
            user_id,
            SNAPSHOT_DAY_END,
            json!({
                "completed": completed,
                "planned": planned,
                "completion_rate": completion_rate,
                "reflection": reflection,
                "at": now,
            }),
        );
        self.storage.save_learning_snapshot(&snapshot).await?;

        let request =
            MotivationRequest::new(state.current_streak, state.level, MotivationTrigger::DayEnd)
                .with_completion_rate(completion_rate)
                .with_context(reflection)
                .with_style(self.day_end_style);
        let motivation = self.motivator.motivate(&request).await;

        Ok(ResponseData::Motivation {
            motivation,
            gamification: state,
        })
    }
}

/// Drop avoided tags and tasks longer than the session. If nothing survives,
/// the unfiltered open set is used.
fn soft_filter(open: Vec<Candidate>, constraints: &SelectionConstraints) -> Vec<Candidate> {
    let filtered: Vec<Candidate> = open
        .iter()
        .filter(|c| !c.has_any_tag(&constraints.avoid_tags))
        .filter(|c| {
            c.duration_minutes()
                .is_none_or(|minutes| minutes <= constraints.max_minutes)
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        tracing::debug!("soft filters removed every candidate, using the open set");
        open
    } else {
        filtered
    }
}
