use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const STORAGE_BACKENDS: [&str; 2] = ["memory", "sqlite"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "memory" | "sqlite"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// SQLite database file; `~` is expanded.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_backend() -> String {
    "sqlite".into()
}
fn default_path() -> String {
    "~/.nextup/nextup.db".into()
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_path(),
        }
    }
}
