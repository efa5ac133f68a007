//! Deterministic multi-factor priority scoring.
//!
//! Every candidate is scored on its own against a fixed reference time, so the
//! same inputs always yield the same ranking. The composite is
//! `0.4·base + 0.3·deadline + 0.15·dependency + 0.15·preference`, clamped to
//! `[0, 100]`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::core::types::{Candidate, ScoreBreakdown, ScoredCandidate, UserProfile};
use crate::utils::time::{parse_deadline, parse_timestamp};

const WEIGHT_BASE_PRIORITY: f64 = 0.4;
const WEIGHT_DEADLINE: f64 = 0.3;
const WEIGHT_DEPENDENCY: f64 = 0.15;
const WEIGHT_PREFERENCE: f64 = 0.15;

const DEADLINE_MISSING: f64 = 25.0;
const DEPENDENCY_UNKNOWN: f64 = 50.0;

const PREFERENCE_BASE: f64 = 50.0;
const PREFERENCE_TAG_BONUS: f64 = 20.0;
const PREFERENCE_DURATION_CLOSE: f64 = 15.0;
const PREFERENCE_DURATION_NEAR: f64 = 7.5;
const PREFERENCE_HISTORY_MAX: f64 = 15.0;

/// Duration used for ordering when a task has no usable estimate.
pub const MISSING_DURATION_SORT_KEY: u32 = 999;

/// Scores candidates relative to a fixed "now".
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    now: DateTime<Utc>,
}

impl ScoringEngine {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn score(&self, candidate: &Candidate, profile: &UserProfile) -> ScoredCandidate {
        let breakdown = ScoreBreakdown {
            base_priority: candidate.priority.base_score(),
            deadline_proximity: self.deadline_proximity(candidate.due_at.as_deref()),
            dependency_impact: dependency_impact(candidate, profile),
            preference_alignment: preference_alignment(candidate, profile),
        };

        let composite = WEIGHT_BASE_PRIORITY * breakdown.base_priority
            + WEIGHT_DEADLINE * breakdown.deadline_proximity
            + WEIGHT_DEPENDENCY * breakdown.dependency_impact
            + WEIGHT_PREFERENCE * breakdown.preference_alignment;

        ScoredCandidate {
            candidate: candidate.clone(),
            score: composite.clamp(0.0, 100.0),
            score_breakdown: breakdown,
        }
    }

    /// Score every candidate and sort best-first; equal scores fall back to
    /// [`tie_break`].
    pub fn rank(&self, candidates: &[Candidate], profile: &UserProfile) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|candidate| self.score(candidate, profile))
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| tie_break(&a.candidate, &b.candidate))
        });
        scored
    }

    fn deadline_proximity(&self, due_at: Option<&str>) -> f64 {
        let Some(due) = due_at.and_then(parse_deadline) else {
            return DEADLINE_MISSING;
        };

        if due < self.now {
            return 100.0;
        }
        if due.date_naive() == self.now.date_naive() {
            return 90.0;
        }

        #[allow(clippy::cast_precision_loss)]
        let days_until = (due - self.now).num_minutes() as f64 / (24.0 * 60.0);
        match days_until {
            d if d <= 1.0 => 80.0,
            d if d <= 3.0 => 60.0,
            d if d <= 7.0 => 40.0,
            _ => 10.0,
        }
    }
}

fn dependency_impact(candidate: &Candidate, profile: &UserProfile) -> f64 {
    let Some(blocked_counts) = &profile.blocked_counts else {
        return DEPENDENCY_UNKNOWN;
    };
    match blocked_counts.get(&candidate.id).copied().unwrap_or(0) {
        0 => 100.0,
        1..=2 => 75.0,
        3..=5 => 50.0,
        _ => 25.0,
    }
}

fn preference_alignment(candidate: &Candidate, profile: &UserProfile) -> f64 {
    let mut score = PREFERENCE_BASE;

    if candidate.has_any_tag(&profile.preferred_tags) {
        score += PREFERENCE_TAG_BONUS;
    }

    if let (Some(duration), Some(preferred)) =
        (candidate.duration_minutes(), profile.preferred_duration)
    {
        match duration.abs_diff(preferred) {
            0..=15 => score += PREFERENCE_DURATION_CLOSE,
            16..=30 => score += PREFERENCE_DURATION_NEAR,
            _ => {}
        }
    }

    let total = profile.total_completions();
    if total > 0 {
        let at_priority = profile
            .completed_by_priority
            .get(&candidate.priority)
            .copied()
            .unwrap_or(0);
        score += PREFERENCE_HISTORY_MAX * f64::from(at_priority) / f64::from(total);
    }

    score.clamp(0.0, 100.0)
}

/// Total, reproducible ordering used for ties and by the deterministic
/// fallback: priority weight desc, duration asc (missing = 999), creation time
/// asc (missing last), id asc.
pub fn tie_break(a: &Candidate, b: &Candidate) -> Ordering {
    b.priority
        .weight()
        .cmp(&a.priority.weight())
        .then_with(|| {
            let da = a.duration_minutes().unwrap_or(MISSING_DURATION_SORT_KEY);
            let db = b.duration_minutes().unwrap_or(MISSING_DURATION_SORT_KEY);
            da.cmp(&db)
        })
        .then_with(|| {
            let ca = a.created_at.as_deref().and_then(parse_timestamp);
            let cb = b.created_at.as_deref().and_then(parse_timestamp);
            match (ca, cb) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
        .then_with(|| a.id.cmp(&b.id))
}
