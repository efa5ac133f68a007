mod core;
mod gamification;
mod generation;
mod observability;
mod selection;
mod storage;

pub use self::core::Config;
pub use gamification::GamificationConfig;
pub use generation::GenerationConfig;
pub use observability::ObservabilityConfig;
pub use selection::SelectionConfig;
pub use storage::{STORAGE_BACKENDS, StorageConfig};
