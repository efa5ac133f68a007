use std::time::Duration;

use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `nextup`.
///
/// Only errors that reach the caller live here. Failures on the generative path
/// are absorbed by the fallback machinery and never show up as a `NextupError`
/// (see [`crate::core::guarded::AttemptFailure`]).
#[derive(Debug, Error)]
pub enum NextupError {
    // ── Storage collaborator ─────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Caller contract ──────────────────────────────────────────────────
    #[error("no candidate tasks available for user {user_id}")]
    NoCandidates { user_id: String },

    // ── Inbound events ───────────────────────────────────────────────────
    #[error("unknown event type '{type_name}'")]
    UnknownEvent { type_name: String },

    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },

    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Prompt / Template ────────────────────────────────────────────────
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    // ── Generic fallthrough (wraps anyhow for interop) ───────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NextupError {
    /// Stable machine-readable code carried in failed responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage_unavailable",
            Self::NoCandidates { .. } => "no_candidates",
            Self::UnknownEvent { .. } => "unknown_event",
            Self::InvalidEvent { .. } => "invalid_event",
            Self::Config(_) => "config_invalid",
            Self::Prompt(_) => "prompt_error",
            Self::Other(_) => "internal_error",
        }
    }
}

// ─── Storage errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend {backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    #[error("corrupt record for {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl StorageError {
    pub fn unavailable(backend: &str, message: impl ToString) -> Self {
        Self::Unavailable {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::unavailable("sqlite", err)
    }
}

// ─── Generative backend errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("backend {backend} request failed: {message}")]
    Request { backend: String, message: String },

    #[error("backend {backend} returned HTTP {status}: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("backend {backend} exceeded deadline of {}ms", .deadline.as_millis())]
    Timeout { backend: String, deadline: Duration },

    #[error("backend {backend} returned an empty reply")]
    EmptyReply { backend: String },

    #[error("generation is disabled")]
    Disabled,
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Prompt / Template errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("template not found: {0}")]
    NotFound(String),
}

impl From<tera::Error> for PromptError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Render(message)
    }
}

// ─── Convenience re-exports ──────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, NextupError>;
