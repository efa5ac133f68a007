use serde::{Deserialize, Serialize};

use crate::core::coaching::MotivationStyle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// "none" | "compatible"
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Deadline for one generative call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Motivation length on app open: "brief" (150 chars) | "full" (300 chars).
    #[serde(default = "default_app_open_style")]
    pub app_open_style: MotivationStyle,
    /// Motivation length at day end.
    #[serde(default = "default_day_end_style")]
    pub day_end_style: MotivationStyle,
}

fn default_backend() -> String {
    "none".into()
}
fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_temperature() -> f64 {
    0.3
}
fn default_max_tokens() -> u32 {
    400
}
fn default_timeout_ms() -> u64 {
    3000
}
fn default_app_open_style() -> MotivationStyle {
    MotivationStyle::Brief
}
fn default_day_end_style() -> MotivationStyle {
    MotivationStyle::Full
}

impl GenerationConfig {
    pub fn deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_timeout_ms(),
            app_open_style: default_app_open_style(),
            day_end_style: default_day_end_style(),
        }
    }
}
