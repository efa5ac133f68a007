//! XP, level and daily-streak state machine.
//!
//! [`GamificationLedger::apply`] is the only transition: it is pure and
//! returns the next state plus the transaction to append. [`GamificationLedger::record`]
//! wraps it with exactly one state write and one transaction append.

pub mod levels;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::core::storage::Storage;
use crate::core::types::{GamificationState, Priority, XpAction, XpTransaction};
use crate::error::StorageError;
use levels::LevelTable;

/// Result of one ledger transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerUpdate {
    pub state: GamificationState,
    pub transaction: XpTransaction,
    pub xp_awarded: u32,
    pub leveled_up: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GamificationLedger {
    levels: LevelTable,
}

impl GamificationLedger {
    pub fn new(levels: LevelTable) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn xp_for(action: &XpAction) -> u32 {
        match action {
            XpAction::TaskCompleted { priority, .. } => match priority {
                Priority::High | Priority::Urgent => 20,
                Priority::Medium => 15,
                Priority::Low | Priority::Unknown => 10,
            },
            XpAction::SessionCompleted { duration_minutes } => match duration_minutes {
                0..=30 => 5,
                31..=90 => 10,
                _ => 15,
            },
        }
    }

    pub fn apply(
        &self,
        state: &GamificationState,
        action: &XpAction,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> LedgerUpdate {
        let xp_awarded = Self::xp_for(action);
        let total_xp = state.total_xp.saturating_add(u64::from(xp_awarded));
        let level = self.levels.level_for(total_xp).max(state.level);
        let (current_streak, last_activity_date) = advance_streak(state, date);

        let next = GamificationState {
            user_id: state.user_id.clone(),
            total_xp,
            level,
            current_streak,
            longest_streak: state.longest_streak.max(current_streak),
            last_activity_date,
        };

        let transaction = XpTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: state.user_id.clone(),
            action: action.clone(),
            xp_delta: xp_awarded,
            occurred_on: date,
            recorded_at: now,
        };

        LedgerUpdate {
            leveled_up: next.level > state.level,
            state: next,
            transaction,
            xp_awarded,
        }
    }

    /// Read-modify-write against `storage`. Callers serialize per user.
    ///
    /// The transaction is appended before the aggregate is written, so a failed
    /// state write leaves the transaction log ahead of the aggregate, never
    /// behind it.
    pub async fn record(
        &self,
        storage: &dyn Storage,
        user_id: &str,
        action: &XpAction,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<LedgerUpdate, StorageError> {
        let current = storage
            .get_gamification_state(user_id)
            .await?
            .unwrap_or_else(|| GamificationState::new(user_id));

        let update = self.apply(&current, action, date, now);
        storage.append_xp_transaction(&update.transaction).await?;
        storage.save_gamification_state(&update.state).await?;

        tracing::debug!(
            user_id,
            xp = update.xp_awarded,
            total_xp = update.state.total_xp,
            level = update.state.level,
            streak = update.state.current_streak,
            "ledger updated"
        );
        Ok(update)
    }
}

/// Streak and last-activity date after activity on `date`.
fn advance_streak(state: &GamificationState, date: NaiveDate) -> (u32, Option<NaiveDate>) {
    let Some(last) = state.last_activity_date else {
        return (1, Some(date));
    };

    match (date - last).num_days() {
        // back-dated activity keeps the streak and the last date
        d if d < 0 => (state.current_streak, Some(last)),
        0 => (state.current_streak, Some(last)),
        1 => (state.current_streak.saturating_add(1), Some(date)),
        _ => (1, Some(date)),
    }
}
