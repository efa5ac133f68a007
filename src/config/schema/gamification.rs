use serde::{Deserialize, Serialize};

use crate::core::gamification::levels::default_thresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    /// Cumulative XP needed for each level; entry `n` unlocks level `n + 1`.
    #[serde(default = "default_thresholds")]
    pub level_thresholds: Vec<u64>,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            level_thresholds: default_thresholds(),
        }
    }
}
