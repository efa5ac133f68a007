//! Coaching note for the selected task: one generative attempt validated
//! against length and sentence bounds, with a fixed template as fallback.

pub mod motivation;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::guarded::{AttemptFuture, Guarded, run_guarded};
use crate::core::types::{Candidate, CoachingOutput, Mode, ReasonCode};
use crate::core::validate::OutputContract;
use crate::llm::{GenerationSettings, GenerativeBackend};
use crate::observability::Observer;
use crate::prompt::{PromptLibrary, PromptTemplate};
use crate::utils::text::{char_len, count_sentences, count_words};

pub use motivation::{
    MotivationGenerator, MotivationRequest, MotivationStyle, MotivationTrigger, categorize,
};

pub const TITLE_MAX_CHARS: usize = 100;
pub const MESSAGE_MIN_CHARS: usize = 5;
pub const MESSAGE_MAX_CHARS: usize = 300;
pub const MESSAGE_MAX_SENTENCES: usize = 2;
pub const NEXT_STEP_MAX_CHARS: usize = 100;
pub const NEXT_STEP_MAX_WORDS: usize = 10;

pub fn fallback_coaching() -> CoachingOutput {
    CoachingOutput {
        title: "Let's go".into(),
        message: "You've got this.".into(),
        next_step: "Begin.".into(),
    }
}

#[derive(Debug, Deserialize)]
pub struct RawCoaching {
    pub title: String,
    pub message: String,
    pub next_step: String,
}

pub struct CoachingContract;

impl OutputContract for CoachingContract {
    type Raw = RawCoaching;
    type Output = CoachingOutput;

    fn name(&self) -> &'static str {
        "coaching"
    }

    fn check(&self, raw: RawCoaching) -> Result<CoachingOutput, String> {
        let title = raw.title.trim();
        let message = raw.message.trim();
        let next_step = raw.next_step.trim();

        let title_len = char_len(title);
        if title_len == 0 || title_len > TITLE_MAX_CHARS {
            return Err(format!("title length {title_len} outside 1..={TITLE_MAX_CHARS}"));
        }

        let message_len = char_len(message);
        if !(MESSAGE_MIN_CHARS..=MESSAGE_MAX_CHARS).contains(&message_len) {
            return Err(format!(
                "message length {message_len} outside {MESSAGE_MIN_CHARS}..={MESSAGE_MAX_CHARS}"
            ));
        }
        let sentences = count_sentences(message);
        if sentences > MESSAGE_MAX_SENTENCES {
            return Err(format!(
                "message has {sentences} sentences, max {MESSAGE_MAX_SENTENCES}"
            ));
        }

        let step_len = char_len(next_step);
        if step_len == 0 || step_len > NEXT_STEP_MAX_CHARS {
            return Err(format!(
                "next_step length {step_len} outside 1..={NEXT_STEP_MAX_CHARS}"
            ));
        }
        let words = count_words(next_step);
        if words > NEXT_STEP_MAX_WORDS {
            return Err(format!("next_step has {words} words, max {NEXT_STEP_MAX_WORDS}"));
        }

        Ok(CoachingOutput {
            title: title.to_string(),
            message: message.to_string(),
            next_step: next_step.to_string(),
        })
    }
}

/// What the coach is told about the selected task.
#[derive(Debug, Clone)]
pub struct CoachingInput {
    pub task: Candidate,
    pub reason_codes: Vec<ReasonCode>,
    pub mode: Mode,
}

#[derive(Serialize)]
struct CoachingPrompt<'a> {
    title: &'a str,
    priority: String,
    minutes: String,
    reasons: String,
    mode: String,
}

pub struct CoachingGenerator {
    backend: Arc<dyn GenerativeBackend>,
    prompts: Arc<PromptLibrary>,
    observer: Arc<dyn Observer>,
    settings: GenerationSettings,
}

impl CoachingGenerator {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        prompts: Arc<PromptLibrary>,
        observer: Arc<dyn Observer>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            backend,
            prompts,
            observer,
            settings,
        }
    }

    /// Always returns a well-formed note.
    pub async fn coach(&self, input: &CoachingInput) -> CoachingOutput {
        run_guarded(self, input, self.settings.deadline, self.observer.as_ref())
            .await
            .value
    }
}

impl Guarded for CoachingGenerator {
    type Input = CoachingInput;
    type Output = CoachingOutput;
    type Contract<'a> = CoachingContract;

    fn stage(&self) -> &'static str {
        "coaching"
    }

    fn contract<'a>(&'a self, _input: &'a CoachingInput) -> CoachingContract {
        CoachingContract
    }

    fn attempt<'a>(&'a self, input: &'a CoachingInput) -> AttemptFuture<'a, String> {
        Box::pin(async move {
            let reasons = if input.reason_codes.is_empty() {
                "best overall fit".to_string()
            } else {
                input
                    .reason_codes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let prompt = self.prompts.render(
                PromptTemplate::Coaching,
                &CoachingPrompt {
                    title: &input.task.title,
                    priority: input.task.priority.to_string(),
                    minutes: input
                        .task
                        .duration_minutes()
                        .map(|m| m.to_string())
                        .unwrap_or_default(),
                    reasons,
                    mode: input.mode.to_string(),
                },
            )?;

            let request = self.settings.request(prompt, self.prompts.system_prompt());
            Ok(self
                .backend
                .generate_structured(&request, self.settings.deadline)
                .await?)
        })
    }

    fn fallback(&self, _input: &CoachingInput) -> CoachingOutput {
        fallback_coaching()
    }
}
