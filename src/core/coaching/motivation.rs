//! Bounded motivation message, not tied to a task.
//!
//! The category is chosen deterministically; only the wording is generative.
//! Over-long or malformed replies are replaced by a template that mentions the
//! streak, or the level when there is no streak.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::guarded::{AttemptFuture, Guarded, run_guarded};
use crate::core::types::{MotivationCategory, MotivationOutput};
use crate::core::validate::OutputContract;
use crate::llm::{GenerationSettings, GenerativeBackend};
use crate::observability::Observer;
use crate::prompt::{PromptLibrary, PromptTemplate};
use crate::utils::text::char_len;

const STREAK_CELEBRATION_DAYS: u32 = 7;
const MOMENTUM_DAYS: u32 = 3;
const HIGH_ACHIEVER_RATE: f64 = 0.8;
const STRUGGLE_MARKERS: [&str; 2] = ["stuck", "struggling"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotivationTrigger {
    AppOpen,
    DayEnd,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotivationStyle {
    #[default]
    Brief,
    Full,
}

impl MotivationStyle {
    pub fn max_chars(self) -> usize {
        match self {
            Self::Brief => 150,
            Self::Full => 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotivationRequest {
    pub streak: u32,
    pub level: u32,
    pub completion_rate: Option<f64>,
    pub context: Option<String>,
    pub trigger: MotivationTrigger,
    pub style: MotivationStyle,
}

impl MotivationRequest {
    pub fn new(streak: u32, level: u32, trigger: MotivationTrigger) -> Self {
        Self {
            streak,
            level,
            completion_rate: None,
            context: None,
            trigger,
            style: MotivationStyle::Brief,
        }
    }

    #[must_use]
    pub fn with_completion_rate(mut self, rate: Option<f64>) -> Self {
        self.completion_rate = rate;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context.filter(|c| !c.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: MotivationStyle) -> Self {
        self.style = style;
        self
    }
}

/// First matching rule wins: long streak, short streak, high completion rate,
/// struggle in the context, then the trigger's default.
pub fn categorize(request: &MotivationRequest) -> MotivationCategory {
    if request.streak >= STREAK_CELEBRATION_DAYS {
        return MotivationCategory::StreakCelebration;
    }
    if request.streak >= MOMENTUM_DAYS {
        return MotivationCategory::MomentumBuilding;
    }
    if request
        .completion_rate
        .is_some_and(|rate| rate >= HIGH_ACHIEVER_RATE)
    {
        return MotivationCategory::HighAchiever;
    }
    if let Some(context) = &request.context {
        let lowered = context.to_lowercase();
        if STRUGGLE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return MotivationCategory::OvercomingChallenge;
        }
    }
    match request.trigger {
        MotivationTrigger::AppOpen => MotivationCategory::FreshStart,
        MotivationTrigger::DayEnd => MotivationCategory::DailyReflection,
        MotivationTrigger::General => MotivationCategory::GentleEncouragement,
    }
}

/// Template message; always within the brief limit.
pub fn template_message(category: MotivationCategory, streak: u32, level: u32) -> String {
    let opener = match category {
        MotivationCategory::StreakCelebration => "What a run!",
        MotivationCategory::MomentumBuilding => "Momentum is building.",
        MotivationCategory::HighAchiever => "You have been getting things done.",
        MotivationCategory::OvercomingChallenge => "Stuck is temporary. One small step counts.",
        MotivationCategory::FreshStart => "Fresh start today.",
        MotivationCategory::DailyReflection => "Nice work wrapping up the day.",
        MotivationCategory::GentleEncouragement => "Every step counts.",
    };
    if streak > 0 {
        format!("{opener} You're on a {streak}-day streak.")
    } else {
        format!("{opener} You're at level {level}.")
    }
}

#[derive(Debug, Deserialize)]
pub struct RawMotivation {
    pub message: String,
}

pub struct MotivationContract {
    max_chars: usize,
}

impl OutputContract for MotivationContract {
    type Raw = RawMotivation;
    type Output = String;

    fn name(&self) -> &'static str {
        "motivation"
    }

    fn check(&self, raw: RawMotivation) -> Result<String, String> {
        let message = raw.message.trim();
        let len = char_len(message);
        if len == 0 {
            return Err("message is empty".into());
        }
        if len > self.max_chars {
            return Err(format!("message length {len} exceeds {}", self.max_chars));
        }
        Ok(message.to_string())
    }
}

#[derive(Serialize)]
struct MotivationPrompt<'a> {
    category: String,
    streak: u32,
    level: u32,
    completion_rate: String,
    context: &'a str,
    max_chars: usize,
}

pub struct MotivationGenerator {
    backend: Arc<dyn GenerativeBackend>,
    prompts: Arc<PromptLibrary>,
    observer: Arc<dyn Observer>,
    settings: GenerationSettings,
}

impl MotivationGenerator {
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

    pub async fn motivate(&self, request: &MotivationRequest) -> MotivationOutput {
        let category = categorize(request);
        let outcome =
            run_guarded(self, request, self.settings.deadline, self.observer.as_ref()).await;
        MotivationOutput {
            category,
            is_fallback: !outcome.is_generative(),
            message: outcome.value,
        }
    }
}

impl Guarded for MotivationGenerator {
    type Input = MotivationRequest;
    type Output = String;
    type Contract<'a> = MotivationContract;

    fn stage(&self) -> &'static str {
        "motivation"
    }

    fn contract<'a>(&'a self, request: &'a MotivationRequest) -> MotivationContract {
        MotivationContract {
            max_chars: request.style.max_chars(),
        }
    }

    fn attempt<'a>(&'a self, request: &'a MotivationRequest) -> AttemptFuture<'a, String> {
        Box::pin(async move {
            let max_chars = request.style.max_chars();
            let prompt = self.prompts.render(
                PromptTemplate::Motivation,
                &MotivationPrompt {
                    category: categorize(request).to_string(),
                    streak: request.streak,
                    level: request.level,
                    completion_rate: request
                        .completion_rate
                        .map(|r| format!("{:.0}", r * 100.0))
                        .unwrap_or_default(),
                    context: request.context.as_deref().unwrap_or_default(),
                    max_chars,
                },
            )?;

            let request = self.settings.request(prompt, self.prompts.system_prompt());
            Ok(self
                .backend
                .generate_structured(&request, self.settings.deadline)
                .await?)
        })
    }

    fn fallback(&self, request: &MotivationRequest) -> String {
        template_message(categorize(request), request.streak, request.level)
    }
}
