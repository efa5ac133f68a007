use std::collections::HashSet;
use std::str::FromStr;

use serde::Deserialize;

use crate::core::types::{MAX_ALTERNATIVES, MAX_REASON_CODES, ReasonCode, SelectionResult};
use crate::core::validate::OutputContract;

use super::fallback::FALLBACK_REASON_CODES;

#[derive(Debug, Deserialize)]
pub struct RawSelection {
    pub task_id: String,
    #[serde(default)]
    pub reason_codes: Vec<String>,
    #[serde(default)]
    pub alt_task_ids: Vec<String>,
}

/// Selection reply rules, checked against the full candidate id set.
pub struct SelectionContract<'a> {
    ids: &'a HashSet<String>,
}

impl<'a> SelectionContract<'a> {
    pub fn new(ids: &'a HashSet<String>) -> Self {
        Self { ids }
    }
}

impl OutputContract for SelectionContract<'_> {
    type Raw = RawSelection;
    type Output = SelectionResult;

    fn name(&self) -> &'static str {
        "selection"
    }

    fn check(&self, raw: RawSelection) -> Result<SelectionResult, String> {
        let task_id = raw.task_id.trim().to_string();
        if !self.ids.contains(&task_id) {
            return Err(format!("task_id '{task_id}' is not a candidate"));
        }

        if raw.reason_codes.is_empty() || raw.reason_codes.len() > MAX_REASON_CODES {
            return Err(format!(
                "expected 1 to {MAX_REASON_CODES} reason codes, got {}",
                raw.reason_codes.len()
            ));
        }

        let mut reason_codes = Vec::with_capacity(raw.reason_codes.len());
        for label in &raw.reason_codes {
            let code = ReasonCode::from_str(label.trim())
                .map_err(|_| format!("unknown reason code '{label}'"))?;
            // fallback markers belong to the deterministic path only
            if FALLBACK_REASON_CODES.contains(&code) {
                return Err(format!("reason code '{label}' is reserved"));
            }
            if !reason_codes.contains(&code) {
                reason_codes.push(code);
            }
        }

        let mut seen = HashSet::from([task_id.as_str()]);
        let alt_task_ids = raw
            .alt_task_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| self.ids.contains(*id) && seen.insert(*id))
            .take(MAX_ALTERNATIVES)
            .map(ToString::to_string)
            .collect();

        Ok(SelectionResult {
            task_id,
            reason_codes,
            alt_task_ids,
            is_valid: true,
        })
    }
}
