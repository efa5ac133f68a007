//! Task selection: score, one generative pick, validation, deterministic
//! fallback. Always yields exactly one [`SelectionResult`] for a non-empty
//! candidate set.

pub mod contract;
pub mod fallback;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::{GenerationConfig, SelectionConfig};
use crate::core::guarded::{AttemptFuture, Guarded, run_guarded};
use crate::core::scoring::ScoringEngine;
use crate::core::types::{
    Candidate, ReasonCode, ScoredCandidate, SelectionConstraints, SelectionResult, UserProfile,
};

use crate::error::NextupError;
use crate::llm::{GenerationSettings, GenerativeBackend};
use crate::observability::{Observer, ObserverEvent, ObserverMetric};
use crate::prompt::{PromptLibrary, PromptTemplate};

use contract::SelectionContract;
use fallback::FALLBACK_REASON_CODES;

#[derive(Debug, Clone)]
pub struct SelectorSettings {
    pub generation: GenerationSettings,
    pub max_prompt_candidates: usize,
}

impl SelectorSettings {
    pub fn from_config(generation: &GenerationConfig, selection: &SelectionConfig) -> Self {
        Self {
            generation: GenerationSettings::from_config(generation),
            max_prompt_candidates: selection.max_prompt_candidates.max(1),
        }
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default(), &SelectionConfig::default())
    }
}

/// Ranked, non-empty candidates plus the precomputed fallback decision.
pub struct SelectionInput {
    ranked: Vec<ScoredCandidate>,
    constraints: SelectionConstraints,
    ids: HashSet<String>,
    fallback: SelectionResult,
}

impl SelectionInput {
    /// `None` when `ranked` is empty.
    pub fn new(ranked: Vec<ScoredCandidate>, constraints: SelectionConstraints) -> Option<Self> {
        let candidates: Vec<Candidate> = ranked.iter().map(|s| s.candidate.clone()).collect();
        let fallback = fallback::select(&candidates)?;
        let ids = candidates.into_iter().map(|c| c.id).collect();
        Some(Self {
            ranked,
            constraints,
            ids,
            fallback,
        })
    }

    pub fn ranked(&self) -> &[ScoredCandidate] {
        &self.ranked
    }
}

#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub result: SelectionResult,
    pub ranked: Vec<ScoredCandidate>,
}

impl SelectionOutcome {
    /// The selected candidate.
    pub fn selected(&self) -> Option<&Candidate> {
        self.ranked
            .iter()
            .map(|s| &s.candidate)
            .find(|c| c.id == self.result.task_id)
    }
}

#[derive(Serialize)]
struct PromptCandidate {
    id: String,
    title: String,
    priority: String,
    minutes: String,
    due: String,
    tags: String,
    score: String,
}

#[derive(Serialize)]
struct SelectionPrompt {
    max_minutes: u32,
    mode: String,
    energy: u8,
    avoid_tags: String,
    prefer_priority: String,
    candidates: Vec<PromptCandidate>,
    reason_codes: String,
}

pub struct TaskSelector {
    backend: Arc<dyn GenerativeBackend>,
    prompts: Arc<PromptLibrary>,
    observer: Arc<dyn Observer>,
    settings: SelectorSettings,
}

impl TaskSelector {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        prompts: Arc<PromptLibrary>,
        observer: Arc<dyn Observer>,
        settings: SelectorSettings,
    ) -> Self {
        Self {
            backend,
            prompts,
            observer,
            settings,
        }
    }

    /// Pick the next task among `candidates`, scored against `now`.
    pub async fn select(
        &self,
        user_id: &str,
        candidates: &[Candidate],
        profile: &UserProfile,
        constraints: &SelectionConstraints,
        now: DateTime<Utc>,
    ) -> Result<SelectionOutcome, NextupError> {
        let ranked = ScoringEngine::new(now).rank(candidates, profile);
        self.observer
            .record_metric(&ObserverMetric::CandidatesScored(ranked.len() as u64));

        let input = SelectionInput::new(ranked, constraints.clone()).ok_or_else(|| {
            NextupError::NoCandidates {
                user_id: user_id.to_string(),
            }
        })?;

        self.observer.record_event(&ObserverEvent::SelectionAttempted {
            backend: self.backend.name().to_string(),
            candidates: input.ranked.len(),
        });

        let outcome = run_guarded(
            self,
            &input,
            self.settings.generation.deadline,
            self.observer.as_ref(),
        )
        .await;
        let result = outcome.value;

        tracing::info!(
            user_id,
            task_id = %result.task_id,
            is_valid = result.is_valid,
            "task selected"
        );
        self.observer.record_event(&ObserverEvent::SelectionCompleted {
            task_id: result.task_id.clone(),
            is_valid: result.is_valid,
        });

        Ok(SelectionOutcome {
            result,
            ranked: input.ranked,
        })
    }

    fn render_prompt(&self, input: &SelectionInput) -> Result<String, crate::error::PromptError> {
        let constraints = &input.constraints;
        let candidates = input
            .ranked
            .iter()
            .take(self.settings.max_prompt_candidates)
            .map(|scored| {
                let c = &scored.candidate;
                PromptCandidate {
                    id: c.id.clone(),
                    title: c.title.clone(),
                    priority: c.priority.to_string(),
                    minutes: c
                        .duration_minutes()
                        .map_or_else(|| "unknown".into(), |m| m.to_string()),
                    due: c.due_at.clone().unwrap_or_else(|| "none".into()),
                    tags: if c.tags.is_empty() {
                        "none".into()
                    } else {
                        c.tags.join(", ")
                    },
                    score: format!("{:.1}", scored.score),
                }
            })
            .collect();

        let reason_codes = ReasonCode::iter()
            .filter(|code| !FALLBACK_REASON_CODES.contains(code))
            .map(|code| code.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let data = SelectionPrompt {
            max_minutes: constraints.max_minutes,
            mode: constraints.mode.to_string(),
            energy: constraints.current_energy,
            avoid_tags: constraints.avoid_tags.join(", "),
            prefer_priority: constraints
                .prefer_priority
                .map(|p| p.to_string())
                .unwrap_or_default(),
            candidates,
            reason_codes,
        };
        self.prompts.render(PromptTemplate::Selection, &data)
    }
}

impl Guarded for TaskSelector {
    type Input = SelectionInput;
    type Output = SelectionResult;
    type Contract<'a> = SelectionContract<'a>;

    fn stage(&self) -> &'static str {
        "selection"
    }

    fn contract<'a>(&'a self, input: &'a SelectionInput) -> SelectionContract<'a> {
        SelectionContract::new(&input.ids)
    }

    fn attempt<'a>(&'a self, input: &'a SelectionInput) -> AttemptFuture<'a, String> {
        Box::pin(async move {
            let prompt = self.render_prompt(input)?;
            let generation = &self.settings.generation;
            let request = generation.request(prompt, self.prompts.system_prompt());
            Ok(self
                .backend
                .generate_structured(&request, generation.deadline)
                .await?)
        })
    }

    fn fallback(&self, input: &SelectionInput) -> SelectionResult {
        input.fallback.clone()
    }
}
