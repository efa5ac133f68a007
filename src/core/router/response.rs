use serde::Serialize;

use crate::core::types::{
    Candidate, CoachingOutput, GamificationState, MotivationOutput, SelectionResult,
};
use crate::error::NextupError;

/// Assembled result of one event. Exactly one of `data` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl EventResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorInfo {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

impl From<&NextupError> for EventResponse {
    fn from(err: &NextupError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// Per-handler payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseData {
    NextTask {
        selection: SelectionResult,
        task: Candidate,
        coaching: CoachingOutput,
    },
    Motivation {
        motivation: MotivationOutput,
        gamification: GamificationState,
    },
    Progress {
        state: GamificationState,
        xp_awarded: u32,
        leveled_up: bool,
    },
}
