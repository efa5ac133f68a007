use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};

use super::{LearningSnapshot, Storage, StorageFuture};
use crate::core::types::{
    Candidate, GamificationState, Priority, TaskStatus, UserProfile, XpAction, XpTransaction,
};
use crate::error::StorageError;

const SCHEMA: [&str; 6] = [
    "CREATE TABLE IF NOT EXISTS tasks (
         user_id TEXT NOT NULL,
         id TEXT NOT NULL,
         title TEXT NOT NULL,
         priority TEXT NOT NULL,
         status TEXT NOT NULL,
         estimated_duration INTEGER,
         due_at TEXT,
         tags TEXT NOT NULL DEFAULT '[]',
         created_at TEXT,
         PRIMARY KEY (user_id, id)
     )",
    "CREATE TABLE IF NOT EXISTS user_profiles (
         user_id TEXT PRIMARY KEY,
         profile TEXT NOT NULL,
         updated_at TEXT NOT NULL
     )",
    "CREATE TABLE IF NOT EXISTS gamification_state (
         user_id TEXT PRIMARY KEY,
         total_xp INTEGER NOT NULL,
         level INTEGER NOT NULL,
         current_streak INTEGER NOT NULL,
         longest_streak INTEGER NOT NULL,
         last_activity_date TEXT
     )",
    "CREATE TABLE IF NOT EXISTS xp_transactions (
         id TEXT PRIMARY KEY,
         user_id TEXT NOT NULL,
         action TEXT NOT NULL,
         xp_delta INTEGER NOT NULL,
         occurred_on TEXT NOT NULL,
         recorded_at TEXT NOT NULL
     )",
    "CREATE TABLE IF NOT EXISTS learning_snapshots (
         id INTEGER PRIMARY KEY AUTOINCREMENT,
         user_id TEXT NOT NULL,
         tag TEXT NOT NULL,
         data TEXT NOT NULL,
         created_at TEXT NOT NULL,
         expires_at TEXT
     )",
    "CREATE INDEX IF NOT EXISTS idx_xp_transactions_user
         ON xp_transactions(user_id, recorded_at)",
];

/// SQLite-backed storage using an sqlx async pool.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::unavailable("sqlite", e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::new(pool).await
    }

    /// Private in-memory database; one connection so every query sees it.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::new(pool).await
    }

    /// Wrap an existing pool and create missing tables.
    pub async fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn upsert_task(&self, user_id: &str, task: &Candidate) -> Result<(), StorageError> {
        let tags = serde_json::to_string(&task.tags).map_err(|e| corrupt(&task.id, e))?;
        sqlx::query(
            "INSERT INTO tasks (user_id, id, title, priority, status, estimated_duration, due_at, tags, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT(user_id, id) DO UPDATE SET
                 title = excluded.title,
                 priority = excluded.priority,
                 status = excluded.status,
                 estimated_duration = excluded.estimated_duration,
                 due_at = excluded.due_at,
                 tags = excluded.tags,
                 created_at = excluded.created_at",
        )
        .bind(user_id)
        .bind(&task.id)
        .bind(&task.title)
        .bind(task.priority.to_string())
        .bind(task.status.to_string())
        .bind(task.estimated_duration.map(i64::from))
        .bind(task.due_at.as_deref())
        .bind(tags)
        .bind(task.created_at.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(profile).map_err(|e| corrupt(user_id, e))?;
        sqlx::query(
            "INSERT INTO user_profiles (user_id, profile, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(user_id) DO UPDATE SET profile = excluded.profile, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(json)
        .bind(sql_time(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn transactions(&self, user_id: &str) -> Result<Vec<XpTransaction>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, user_id, action, xp_delta, occurred_on, recorded_at
             FROM xp_transactions
             WHERE user_id = $1
             ORDER BY recorded_at, rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_transaction_row).collect()
    }

    /// Snapshots for `user_id` and `tag` that have not expired at `now`.
    pub async fn active_snapshots(
        &self,
        user_id: &str,
        tag: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT data FROM learning_snapshots
             WHERE user_id = $1 AND tag = $2 AND (expires_at IS NULL OR expires_at > $3)
             ORDER BY id",
        )
        .bind(user_id)
        .bind(tag)
        .bind(sql_time(now))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_str(&data).map_err(|e| corrupt(tag, e)))
            .collect()
    }

    /// Delete expired snapshots; returns how many were removed.
    pub async fn purge_expired_snapshots(&self, now: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "DELETE FROM learning_snapshots WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(sql_time(now))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn corrupt(key: &str, err: impl ToString) -> StorageError {
    StorageError::Corrupt {
        key: key.to_string(),
        message: err.to_string(),
    }
}

/// Fixed-width UTC timestamps so text comparison in SQL orders correctly.
fn sql_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn map_task_row(row: &SqliteRow) -> Result<Candidate, StorageError> {
    let id: String = row.try_get("id")?;
    let priority: String = row.try_get("priority")?;
    let status: String = row.try_get("status")?;
    let duration: Option<i64> = row.try_get("estimated_duration")?;
    let tags_raw: String = row.try_get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_raw).map_err(|e| corrupt(&id, e))?;

    Ok(Candidate {
        title: row.try_get("title")?,
        priority: Priority::from_label(&priority),
        status: TaskStatus::from_label(&status),
        estimated_duration: duration.and_then(|d| u32::try_from(d).ok()),
        due_at: row.try_get("due_at")?,
        tags,
        created_at: row.try_get("created_at")?,
        id,
    })
}

fn map_state_row(row: &SqliteRow) -> Result<GamificationState, StorageError> {
    let user_id: String = row.try_get("user_id")?;
    let total_xp: i64 = row.try_get("total_xp")?;
    let level: i64 = row.try_get("level")?;
    let current_streak: i64 = row.try_get("current_streak")?;
    let longest_streak: i64 = row.try_get("longest_streak")?;
    let last_raw: Option<String> = row.try_get("last_activity_date")?;
    let last_activity_date = last_raw
        .map(|raw| raw.parse::<NaiveDate>())
        .transpose()
        .map_err(|e| corrupt(&user_id, e))?;

    Ok(GamificationState {
        total_xp: u64::try_from(total_xp.max(0)).unwrap_or_default(),
        level: from_sql_u32(level).max(1),
        current_streak: from_sql_u32(current_streak),
        longest_streak: from_sql_u32(longest_streak),
        last_activity_date,
        user_id,
    })
}

fn map_transaction_row(row: &SqliteRow) -> Result<XpTransaction, StorageError> {
    let id: String = row.try_get("id")?;
    let action_raw: String = row.try_get("action")?;
    let action: XpAction = serde_json::from_str(&action_raw).map_err(|e| corrupt(&id, e))?;
    let xp_delta: i64 = row.try_get("xp_delta")?;
    let occurred_raw: String = row.try_get("occurred_on")?;
    let recorded_raw: String = row.try_get("recorded_at")?;

    Ok(XpTransaction {
        user_id: row.try_get("user_id")?,
        action,
        xp_delta: from_sql_u32(xp_delta),
        occurred_on: occurred_raw
            .parse::<NaiveDate>()
            .map_err(|e| corrupt(&id, e))?,
        recorded_at: DateTime::parse_from_rfc3339(&recorded_raw)
            .map_err(|e| corrupt(&id, e))?
            .with_timezone(&Utc),
        id,
    })
}

impl Storage for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get_candidates<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, Vec<Candidate>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, title, priority, status, estimated_duration, due_at, tags, created_at
                 FROM tasks
                 WHERE user_id = $1
                 ORDER BY rowid",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

            rows.iter().map(map_task_row).collect()
        })
    }

    fn get_user_profile<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, UserProfile> {
        Box::pin(async move {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT profile FROM user_profiles WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;

            match row {
                Some((json,)) => serde_json::from_str(&json).map_err(|e| corrupt(user_id, e)),
                None => Ok(UserProfile::default()),
            }
        })
    }

    fn get_gamification_state<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StorageFuture<'a, Option<GamificationState>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT user_id, total_xp, level, current_streak, longest_streak, last_activity_date
                 FROM gamification_state
                 WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

            row.map(|r| map_state_row(&r)).transpose()
        })
    }

    fn save_gamification_state<'a>(
        &'a self,
        state: &'a GamificationState,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO gamification_state
                     (user_id, total_xp, level, current_streak, longest_streak, last_activity_date)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     total_xp = excluded.total_xp,
                     level = excluded.level,
                     current_streak = excluded.current_streak,
                     longest_streak = excluded.longest_streak,
                     last_activity_date = excluded.last_activity_date",
            )
            .bind(&state.user_id)
            .bind(to_sql_int(state.total_xp))
            .bind(i64::from(state.level))
            .bind(i64::from(state.current_streak))
            .bind(i64::from(state.longest_streak))
            .bind(state.last_activity_date.map(|d| d.to_string()))
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn append_xp_transaction<'a>(
        &'a self,
        transaction: &'a XpTransaction,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let action =
                serde_json::to_string(&transaction.action).map_err(|e| corrupt(&transaction.id, e))?;
            sqlx::query(
                "INSERT INTO xp_transactions (id, user_id, action, xp_delta, occurred_on, recorded_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&transaction.id)
            .bind(&transaction.user_id)
            .bind(action)
            .bind(i64::from(transaction.xp_delta))
            .bind(transaction.occurred_on.to_string())
            .bind(sql_time(transaction.recorded_at))
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn save_learning_snapshot<'a>(
        &'a self,
        snapshot: &'a LearningSnapshot,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let now = Utc::now();
            let expires_at = snapshot
                .ttl
                .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
                .map(|ttl| sql_time(now + ttl));
            let data = serde_json::to_string(&snapshot.data)
                .map_err(|e| corrupt(&snapshot.tag, e))?;

            sqlx::query(
                "INSERT INTO learning_snapshots (user_id, tag, data, created_at, expires_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&snapshot.user_id)
            .bind(&snapshot.tag)
            .bind(data)
            .bind(sql_time(now))
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }
}
