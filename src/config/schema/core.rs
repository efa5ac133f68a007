use super::{
    GamificationConfig, GenerationConfig, ObservabilityConfig, STORAGE_BACKENDS, SelectionConfig,
    StorageConfig,
};
use crate::core::gamification::levels::LevelTable;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub gamification: GamificationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let nextup_dir = home.join(".nextup");

        if !nextup_dir.exists() {
            fs::create_dir_all(&nextup_dir).context("Failed to create .nextup directory")?;
        }

        Self::load_from(&nextup_dir.join("config.toml"))
    }

    /// Load `path`, writing defaults there first when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = path.to_path_buf();
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path: path.to_path_buf(),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an injectable lookup.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(backend) = non_empty("NEXTUP_BACKEND") {
            self.generation.backend = backend;
        }

        if let Some(key) = non_empty("NEXTUP_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.generation.api_key = Some(key);
        }

        if let Some(model) = non_empty("NEXTUP_MODEL") {
            self.generation.model = model;
        }

        if let Some(url) = non_empty("NEXTUP_BASE_URL") {
            self.generation.base_url = url;
        }

        if let Some(timeout) = non_empty("NEXTUP_TIMEOUT_MS")
            && let Ok(ms) = timeout.parse::<u64>()
        {
            self.generation.timeout_ms = ms;
        }

        if let Some(path) = non_empty("NEXTUP_DB_PATH") {
            self.storage.path = path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.generation.temperature;
        if temperature.is_nan() || !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Validation(
                "generation.temperature must be in [0.0, 2.0]".into(),
            ));
        }
        if self.generation.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "generation.timeout_ms must be > 0".into(),
            ));
        }
        if self.generation.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "generation.max_tokens must be > 0".into(),
            ));
        }
        if self.selection.max_prompt_candidates == 0 {
            return Err(ConfigError::Validation(
                "selection.max_prompt_candidates must be >= 1".into(),
            ));
        }
        if !STORAGE_BACKENDS.contains(&self.storage.backend.as_str()) {
            return Err(ConfigError::Validation(format!(
                "storage.backend must be one of {STORAGE_BACKENDS:?}, got '{}'",
                self.storage.backend
            )));
        }
        self.level_table()?;
        Ok(())
    }

    pub fn level_table(&self) -> Result<LevelTable, ConfigError> {
        LevelTable::new(self.gamification.level_thresholds.clone()).map_err(|reason| {
            ConfigError::Validation(format!("gamification.level_thresholds: {reason}"))
        })
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
