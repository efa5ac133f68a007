//! Deterministic fallback selection.
//!
//! Total order: priority weight desc, duration asc (missing last via a large
//! sort key), created_at asc (missing last), id asc. The first candidate is
//! selected and the next two become alternatives.

use std::collections::HashSet;

use crate::core::scoring::tie_break;
use crate::core::types::{Candidate, MAX_ALTERNATIVES, ReasonCode, SelectionResult};

pub const FALLBACK_REASON_CODES: [ReasonCode; 2] =
    [ReasonCode::Fallback, ReasonCode::FallbackDeterministic];

/// `None` only for an empty slice.
pub fn select(candidates: &[Candidate]) -> Option<SelectionResult> {
    let mut ordered: Vec<&Candidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| tie_break(a, b));

    let (first, rest) = ordered.split_first()?;
    let mut seen = HashSet::from([first.id.as_str()]);
    let alt_task_ids = rest
        .iter()
        .filter(|c| seen.insert(c.id.as_str()))
        .take(MAX_ALTERNATIVES)
        .map(|c| c.id.clone())
        .collect();

    Some(SelectionResult {
        task_id: first.id.clone(),
        reason_codes: FALLBACK_REASON_CODES.to_vec(),
        alt_task_ids,
        is_valid: false,
    })
}
