//! One interface for every generative step: an attempt that may fail, the
//! contract its reply must meet and a deterministic fallback that cannot fail.
//! [`run_guarded`] is the only place they are combined, so no caller can skip
//! the deadline, the validation or the fallback.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::core::validate::{self, OutputContract, Violation};
use crate::error::{GenerationError, PromptError};
use crate::observability::{Observer, ObserverEvent, ObserverMetric};

/// Why a generative attempt did not produce a usable value. Never surfaced
/// to callers; it only selects the fallback path and feeds the logs.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("backend: {0}")]
    Backend(#[from] GenerationError),

    #[error("deadline of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("{0}")]
    Invalid(#[from] Violation),
}

impl AttemptFailure {
    /// Short label for events and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Backend(GenerationError::Disabled) => "disabled",
            Self::Backend(GenerationError::Timeout { .. }) | Self::Timeout(_) => "timeout",
            Self::Backend(_) => "backend",
            Self::Prompt(_) => "prompt",
            Self::Invalid(Violation::Schema { .. }) => "schema",
            Self::Invalid(Violation::Domain { .. }) => "domain",
        }
    }
}

pub type AttemptFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AttemptFailure>> + Send + 'a>>;

pub trait Guarded: Send + Sync {
    type Input: Sync;
    type Output: Send;
    type Contract<'a>: OutputContract<Output = Self::Output>
    where
        Self: 'a,
        Self::Input: 'a;

    /// Pipeline stage name used in logs and observer events.
    fn stage(&self) -> &'static str;

    /// Rules the raw reply for `input` must satisfy.
    fn contract<'a>(&'a self, input: &'a Self::Input) -> Self::Contract<'a>;

    /// One generative call. Returns the raw reply text.
    fn attempt<'a>(&'a self, input: &'a Self::Input) -> AttemptFuture<'a, String>;

    /// Must be pure and always succeed.
    fn fallback(&self, input: &Self::Input) -> Self::Output;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Generative,
    Fallback,
}

#[derive(Debug)]
pub struct GuardedOutcome<T> {
    pub value: T,
    pub source: Source,
}

impl<T> GuardedOutcome<T> {
    pub fn is_generative(&self) -> bool {
        self.source == Source::Generative
    }
}

/// Run one attempt under `deadline` and validate the reply against the step's
/// contract, with the fallback as the default. Any failure yields the fallback.
pub async fn run_guarded<G: Guarded>(
    step: &G,
    input: &G::Input,
    deadline: Duration,
    observer: &dyn Observer,
) -> GuardedOutcome<G::Output> {
    let started = Instant::now();
    let reply = match tokio::time::timeout(deadline, step.attempt(input)).await {
        Ok(reply) => reply,
        Err(_) => Err(AttemptFailure::Timeout(deadline)),
    };
    observer.record_metric(&ObserverMetric::GenerationLatency(started.elapsed()));

    let (value, failure) = match reply {
        Ok(raw) => {
            let validated = validate::validate(&raw, &step.contract(input), || step.fallback(input));
            match validated.violation {
                None => {
                    return GuardedOutcome {
                        value: validated.value,
                        source: Source::Generative,
                    };
                }
                Some(violation) => (validated.value, AttemptFailure::Invalid(violation)),
            }
        }
        Err(failure) => (step.fallback(input), failure),
    };

    tracing::warn!(
        stage = step.stage(),
        kind = failure.kind(),
        "generative attempt failed, using fallback: {failure}"
    );
    observer.record_event(&ObserverEvent::FallbackUsed {
        stage: step.stage(),
        reason: failure.kind().to_string(),
    });
    GuardedOutcome {
        value,
        source: Source::Fallback,
    }
}
