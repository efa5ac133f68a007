use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// Priority: task priority; unrecognised labels are kept as `Unknown`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, Default,
)]
#[serde(rename_all = "snake_case", from = "String")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
    Unknown,
}

impl Priority {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Unknown,
        }
    }

    /// Base priority component of the composite score.
    pub fn base_score(self) -> f64 {
        match self {
            Self::Urgent => 100.0,
            Self::High => 75.0,
            Self::Medium | Self::Unknown => 50.0,
            Self::Low => 25.0,
        }
    }

    /// Ordering weight for deterministic tie-breaks (higher wins).
    pub fn weight(self) -> u8 {
        match self {
            Self::Urgent => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

// TaskStatus: lifecycle state reported by the task source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case", from = "String")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Done,
    Cancelled,
    Unknown,
}

impl TaskStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "todo" | "pending" | "open" => Self::Todo,
            "in_progress" | "doing" => Self::InProgress,
            "blocked" => Self::Blocked,
            "done" | "completed" => Self::Done,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// Whether a task in this state may still be picked.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Done | Self::Cancelled)
    }
}

impl From<String> for TaskStatus {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

pub const MIN_TASK_MINUTES: u32 = 1;
pub const MAX_TASK_MINUTES: u32 = 1440;

/// A task eligible for selection in one decision round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority,
            status: TaskStatus::Todo,
            estimated_duration: None,
            due_at: None,
            tags: Vec::new(),
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_due(mut self, due_at: impl Into<String>) -> Self {
        self.due_at = Some(due_at.into());
        self
    }

    #[must_use]
    pub fn with_created(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Estimated duration, ignoring values outside 1–1440 minutes.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.estimated_duration
            .filter(|m| (MIN_TASK_MINUTES..=MAX_TASK_MINUTES).contains(m))
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags
            .iter()
            .any(|own| tags.iter().any(|other| own.eq_ignore_ascii_case(other)))
    }
}

// Mode: what kind of work session the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    Focus,
    Quick,
    Learning,
    #[default]
    Balanced,
}

impl Mode {
    /// Mode implied by a self-reported energy level when none was requested.
    pub fn for_energy(energy: u8) -> Self {
        match energy {
            0..=3 => Self::Quick,
            8.. => Self::Focus,
            _ => Self::Balanced,
        }
    }
}

pub const MIN_SESSION_MINUTES: u32 = 5;
pub const MAX_SESSION_MINUTES: u32 = 1440;
pub const MIN_ENERGY: u8 = 1;
pub const MAX_ENERGY: u8 = 10;

/// Per-event selection constraints. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConstraints {
    pub max_minutes: u32,
    pub mode: Mode,
    pub current_energy: u8,
    #[serde(default)]
    pub avoid_tags: Vec<String>,
    #[serde(default)]
    pub prefer_priority: Option<Priority>,
}

impl SelectionConstraints {
    /// Build constraints, clamping minutes to 5–1440 and energy to 1–10.
    pub fn new(max_minutes: u32, mode: Mode, current_energy: u8) -> Self {
        Self {
            max_minutes: max_minutes.clamp(MIN_SESSION_MINUTES, MAX_SESSION_MINUTES),
            mode,
            current_energy: current_energy.clamp(MIN_ENERGY, MAX_ENERGY),
            avoid_tags: Vec::new(),
            prefer_priority: None,
        }
    }

    #[must_use]
    pub fn avoiding<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.avoid_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn preferring(mut self, priority: Option<Priority>) -> Self {
        self.prefer_priority = priority;
        self
    }
}

impl Default for SelectionConstraints {
    fn default() -> Self {
        Self::new(60, Mode::Balanced, 5)
    }
}

/// Historical preferences the scoring engine aligns candidates with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub preferred_tags: Vec<String>,
    #[serde(default)]
    pub preferred_duration: Option<u32>,
    #[serde(default)]
    pub completed_by_priority: BTreeMap<Priority, u32>,
    /// Task id → number of tasks it blocks. `None` when dependency data is
    /// unavailable, which is different from "blocks nothing".
    #[serde(default)]
    pub blocked_counts: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub recent_completion_rate: Option<f64>,
}

impl UserProfile {
    pub fn total_completions(&self) -> u32 {
        self.completed_by_priority.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_priority: f64,
    pub deadline_proximity: f64,
    pub dependency_impact: f64,
    pub preference_alignment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
}

// ReasonCode: closed vocabulary explaining a selection
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReasonCode {
    Overdue,
    DeadlineSoon,
    HighPriority,
    QuickWin,
    FitsTime,
    EnergyMatch,
    UnblocksOthers,
    PreferredTag,
    Momentum,
    LearningGoal,
    DeepFocus,
    Fallback,
    FallbackDeterministic,
}

pub const MAX_REASON_CODES: usize = 3;
pub const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub task_id: String,
    pub reason_codes: Vec<ReasonCode>,
    pub alt_task_ids: Vec<String>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingOutput {
    pub title: String,
    pub message: String,
    pub next_step: String,
}

// MotivationCategory: deterministic label for the bounded motivation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MotivationCategory {
    StreakCelebration,
    MomentumBuilding,
    HighAchiever,
    OvercomingChallenge,
    FreshStart,
    DailyReflection,
    GentleEncouragement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotivationOutput {
    pub category: MotivationCategory,
    pub message: String,
    pub is_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationState {
    pub user_id: String,
    pub total_xp: u64,
    pub level: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
}

impl GamificationState {
    /// State of a user with no recorded activity.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
        }
    }
}

// XpAction: an XP-earning action and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum XpAction {
    TaskCompleted {
        #[serde(default)]
        task_id: Option<String>,
        #[serde(default)]
        priority: Priority,
    },
    SessionCompleted {
        duration_minutes: u32,
    },
}

/// Append-only XP ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpTransaction {
    pub id: String,
    pub user_id: String,
    pub action: XpAction,
    pub xp_delta: u32,
    pub occurred_on: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}
