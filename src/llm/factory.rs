use super::compatible::CompatibleBackend;
use super::traits::{DisabledBackend, GenerativeBackend};
use crate::config::GenerationConfig;
use std::sync::Arc;

/// Well-known OpenAI-compatible endpoints, selectable by backend name.
pub fn compatible_backend_url(name: &str) -> Option<&'static str> {
    let url = match name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "mistral" => "https://api.mistral.ai/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "ollama" => "http://localhost:11434/v1",
        _ => return None,
    };
    Some(url)
}

/// Factory: build the configured generative backend.
///
/// `none`/`disabled` switch generation off; `compatible` uses `base_url`
/// as-is; a well-known name uses its public endpoint. Unknown names fall back
/// to disabled so every decision stays deterministic.
pub fn create_backend(config: &GenerationConfig) -> Arc<dyn GenerativeBackend> {
    let name = config.backend.trim().to_ascii_lowercase();
    let base_url = match name.as_str() {
        "none" | "disabled" | "" => return Arc::new(DisabledBackend),
        "compatible" => config.base_url.as_str(),
        other => match compatible_backend_url(other) {
            Some(url) => url,
            None => {
                tracing::warn!(
                    "Unknown generation backend '{}', falling back to disabled",
                    config.backend
                );
                return Arc::new(DisabledBackend);
            }
        },
    };

    Arc::new(CompatibleBackend::new(
        base_url,
        config.api_key.as_deref(),
        &config.model,
    ))
}
