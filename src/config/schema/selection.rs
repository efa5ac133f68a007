use serde::{Deserialize, Serialize};

/// Defaults for constraints an event does not carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_max_minutes")]
    pub default_max_minutes: u32,
    #[serde(default = "default_energy")]
    pub default_energy: u8,
    /// Upper bound on candidates listed in the selection prompt.
    #[serde(default = "default_max_prompt_candidates")]
    pub max_prompt_candidates: usize,
}

fn default_max_minutes() -> u32 {
    60
}
fn default_energy() -> u8 {
    5
}
fn default_max_prompt_candidates() -> usize {
    20
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_max_minutes: default_max_minutes(),
            default_energy: default_energy(),
            max_prompt_candidates: default_max_prompt_candidates(),
        }
    }
}
