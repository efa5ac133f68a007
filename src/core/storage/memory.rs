use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{LearningSnapshot, Storage, StorageFuture};
use crate::core::types::{Candidate, GamificationState, UserProfile, XpTransaction};
use crate::error::StorageError;

#[derive(Default)]
struct Tables {
    candidates: HashMap<String, Vec<Candidate>>,
    profiles: HashMap<String, UserProfile>,
    states: HashMap<String, GamificationState>,
    transactions: Vec<XpTransaction>,
    snapshots: Vec<LearningSnapshot>,
}

/// Process-local storage. Seed it directly; nothing is persisted.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::unavailable("memory", "storage lock poisoned"))
    }

    pub fn seed_candidates(&self, user_id: &str, candidates: Vec<Candidate>) {
        if let Ok(mut tables) = self.lock() {
            tables.candidates.insert(user_id.to_string(), candidates);
        }
    }

    pub fn seed_profile(&self, user_id: &str, profile: UserProfile) {
        if let Ok(mut tables) = self.lock() {
            tables.profiles.insert(user_id.to_string(), profile);
        }
    }

    pub fn seed_state(&self, state: GamificationState) {
        if let Ok(mut tables) = self.lock() {
            tables.states.insert(state.user_id.clone(), state);
        }
    }

    pub fn transactions(&self, user_id: &str) -> Vec<XpTransaction> {
        self.lock()
            .map(|t| {
                t.transactions
                    .iter()
                    .filter(|tx| tx.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn snapshots(&self, user_id: &str) -> Vec<LearningSnapshot> {
        self.lock()
            .map(|t| {
                t.snapshots
                    .iter()
                    .filter(|s| s.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Storage for InMemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_candidates<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, Vec<Candidate>> {
        Box::pin(async move {
            Ok(self
                .lock()?
                .candidates
                .get(user_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn get_user_profile<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, UserProfile> {
        Box::pin(async move {
            Ok(self
                .lock()?
                .profiles
                .get(user_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn get_gamification_state<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StorageFuture<'a, Option<GamificationState>> {
        Box::pin(async move { Ok(self.lock()?.states.get(user_id).cloned()) })
    }

    fn save_gamification_state<'a>(
        &'a self,
        state: &'a GamificationState,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.lock()?
                .states
                .insert(state.user_id.clone(), state.clone());
            Ok(())
        })
    }

    fn append_xp_transaction<'a>(
        &'a self,
        transaction: &'a XpTransaction,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.lock()?.transactions.push(transaction.clone());
            Ok(())
        })
    }

    fn save_learning_snapshot<'a>(
        &'a self,
        snapshot: &'a LearningSnapshot,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.lock()?.snapshots.push(snapshot.clone());
            Ok(())
        })
    }
}
