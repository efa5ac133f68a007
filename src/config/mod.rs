pub mod schema;

pub use schema::{
    Config, GamificationConfig, GenerationConfig, ObservabilityConfig, SelectionConfig,
    StorageConfig,
};
