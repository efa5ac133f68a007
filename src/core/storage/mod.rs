//! Storage collaborator: where candidates, profiles and the ledger live.
//!
//! The decision pipeline only sees [`Storage`]; adapters decide how data is
//! kept. Every failure surfaces as [`StorageError`].

pub mod memory;
pub mod sqlite;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::core::types::{Candidate, GamificationState, UserProfile, XpTransaction};
use crate::error::StorageError;

pub use memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Tagged JSON blob recorded for later learning passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSnapshot {
    pub user_id: String,
    pub tag: String,
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
}

impl LearningSnapshot {
    pub fn new(user_id: impl Into<String>, tag: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            user_id: user_id.into(),
            tag: tag.into(),
            data,
            ttl: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

pub trait Storage: Send + Sync {
    /// Adapter identifier (e.g. "memory", "sqlite").
    fn name(&self) -> &str;

    fn get_candidates<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, Vec<Candidate>>;

    /// Unknown users get an empty profile.
    fn get_user_profile<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, UserProfile>;

    fn get_gamification_state<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StorageFuture<'a, Option<GamificationState>>;

    fn save_gamification_state<'a>(&'a self, state: &'a GamificationState)
    -> StorageFuture<'a, ()>;

    fn append_xp_transaction<'a>(&'a self, transaction: &'a XpTransaction)
    -> StorageFuture<'a, ()>;

    fn save_learning_snapshot<'a>(&'a self, snapshot: &'a LearningSnapshot)
    -> StorageFuture<'a, ()>;
}

/// Factory: build the configured storage adapter.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStorage::new())),
        "sqlite" => {
            let path = config.resolved_path();
            Ok(Arc::new(SqliteStorage::open(&path).await?))
        }
        other => Err(StorageError::unavailable(
            other,
            format!("unknown storage backend '{other}'"),
        )),
    }
}
