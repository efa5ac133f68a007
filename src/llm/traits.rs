use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::GenerationError;

/// One structured-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }

    #[must_use]
    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Sampling parameters and deadline shared by every generative step.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f64,
    pub max_tokens: u32,
    pub deadline: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            deadline: config.deadline(),
        }
    }

    pub fn request(&self, prompt: String, system_prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt, self.temperature, self.max_tokens).with_system(system_prompt)
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Generative text backend.
///
/// Implementations return the raw reply text; callers validate it. A backend
/// must not retry on its own: one request, one reply or one error.
pub trait GenerativeBackend: Send + Sync {
    /// Backend identifier (e.g. "compatible", "disabled").
    fn name(&self) -> &str;

    fn generate_structured<'a>(
        &'a self,
        request: &'a GenerationRequest,
        deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
}

/// Backend used when generation is switched off; every call errors, so every
/// decision takes the deterministic path.
pub struct DisabledBackend;

impl GenerativeBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    fn generate_structured<'a>(
        &'a self,
        _request: &'a GenerationRequest,
        _deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(async move { Err(GenerationError::Disabled) })
    }
}
