//! Single choke point between generative output and the rest of the crate.
//!
//! A contract names the raw serde shape a reply must parse into and the domain
//! rules that turn it into a typed value. Generative steps reach it through
//! [`validate`], called from `run_guarded`; nothing downstream ever sees a
//! reply that has not passed through it.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a generative reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// The reply does not parse into the expected shape.
    #[error("schema violation in {contract}: {detail}")]
    Schema {
        contract: &'static str,
        detail: String,
    },

    /// The reply parses but breaks a domain rule.
    #[error("domain constraint violation in {contract}: {detail}")]
    Domain {
        contract: &'static str,
        detail: String,
    },
}

/// Schema plus domain rules for one kind of generative output.
pub trait OutputContract {
    /// Shape the reply must deserialize into.
    type Raw: DeserializeOwned;
    /// Value handed to the caller once the rules pass.
    type Output;

    fn name(&self) -> &'static str;

    /// Apply domain rules; may normalize (drop unknown ids, trim text).
    fn check(&self, raw: Self::Raw) -> Result<Self::Output, String>;
}

/// Outcome of [`validate`]: either the checked value, or the caller's default
/// together with the violation that forced it. `violation.is_none()` is the
/// validity flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub violation: Option<Violation>,
}

/// Parse and check `raw` against `contract`.
///
/// Violations are logged at warn level with the offending value.
pub fn check<C: OutputContract>(raw: &str, contract: &C) -> Result<C::Output, Violation> {
    let result = extract_json(raw)
        .ok_or_else(|| "no JSON object found".to_string())
        .and_then(|json| serde_json::from_str::<C::Raw>(json).map_err(|e| e.to_string()))
        .map_err(|detail| Violation::Schema {
            contract: contract.name(),
            detail,
        })
        .and_then(|parsed| {
            contract.check(parsed).map_err(|detail| Violation::Domain {
                contract: contract.name(),
                detail,
            })
        });

    if let Err(violation) = &result {
        tracing::warn!(
            contract = contract.name(),
            raw = %preview(raw),
            "rejected generative output: {violation}"
        );
    }
    result
}

/// Never-failing variant of [`check`]: any violation yields `default()` and
/// is kept alongside it.
pub fn validate<C, F>(raw: &str, contract: &C, default: F) -> Validated<C::Output>
where
    C: OutputContract,
    F: FnOnce() -> C::Output,
{
    match check(raw, contract) {
        Ok(value) => Validated {
            value,
            violation: None,
        },
        Err(violation) => Validated {
            value: default(),
            violation: Some(violation),
        },
    }
}

/// Locate the JSON object in a model reply. Models wrap JSON in prose or
/// markdown fences often enough that the outermost `{…}` is taken when the
/// whole reply does not parse.
fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some(trimmed);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

fn preview(raw: &str) -> String {
    crate::utils::text::truncate_with_ellipsis(raw.trim(), 200)
}
