//! Seed data for the CLI: tasks, profiles and gamification state per user.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::storage::{InMemoryStorage, SqliteStorage, Storage};
use crate::core::types::{Candidate, GamificationState, UserProfile};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<UserFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFixture {
    pub user_id: String,
    #[serde(default)]
    pub tasks: Vec<Candidate>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub state: Option<GamificationState>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: usize,
    pub tasks: usize,
}

impl Fixtures {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixtures {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid fixtures {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn into_memory(self) -> InMemoryStorage {
        let storage = InMemoryStorage::new();
        for user in self.users {
            storage.seed_candidates(&user.user_id, user.tasks);
            if let Some(profile) = user.profile {
                storage.seed_profile(&user.user_id, profile);
            }
            if let Some(state) = user.state {
                storage.seed_state(GamificationState {
                    user_id: user.user_id.clone(),
                    ..state
                });
            }
        }
        storage
    }

    pub async fn import_into(&self, storage: &SqliteStorage) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for user in &self.users {
            for task in &user.tasks {
                storage.upsert_task(&user.user_id, task).await?;
                summary.tasks += 1;
            }
            if let Some(profile) = &user.profile {
                storage.set_profile(&user.user_id, profile).await?;
            }
            if let Some(state) = &user.state {
                let state = GamificationState {
                    user_id: user.user_id.clone(),
                    ..state.clone()
                };
                storage.save_gamification_state(&state).await?;
            }
            summary.users += 1;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Priority;

    const SAMPLE: &str = r#"{
        "users": [{
            "user_id": "u1",
            "tasks": [
                {"id": "t1", "title": "Write report", "priority": "high", "estimated_duration": 30},
                {"id": "t2", "title": "Inbox", "priority": "low", "tags": ["email"]}
            ],
            "profile": {"preferred_tags": ["writing"]},
            "state": {"user_id": "ignored", "total_xp": 120, "level": 2,
                      "current_streak": 3, "longest_streak": 5}
        }]
    }"#;

    #[tokio::test]
    async fn seeds_memory_storage() {
        let storage = Fixtures::parse(SAMPLE).unwrap().into_memory();

        let tasks = storage.get_candidates("u1").await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, Priority::High);

        let state = storage.get_gamification_state("u1").await.unwrap().unwrap();
        assert_eq!(state.user_id, "u1");
        assert_eq!(state.total_xp, 120);
    }

    #[tokio::test]
    async fn imports_into_sqlite() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let summary = Fixtures::parse(SAMPLE)
            .unwrap()
            .import_into(&storage)
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { users: 1, tasks: 2 });

        let profile = storage.get_user_profile("u1").await.unwrap();
        assert_eq!(profile.preferred_tags, vec!["writing".to_string()]);
        assert_eq!(storage.get_candidates("u1").await.unwrap().len(), 2);
    }

    #[test]
    fn empty_document_is_valid() {
        assert!(Fixtures::parse("{}").unwrap().users.is_empty());
    }
}
