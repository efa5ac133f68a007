use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr, VariantNames};

use crate::core::types::{Mode, Priority, XpAction};

/// One inbound event. The wire form is a flat JSON object whose `type` field
/// names the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(user_id: impl Into<String>, timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr, VariantNames)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    AppOpen {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
    CheckInSubmitted {
        energy: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        available_minutes: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<Mode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mood: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    DoNext {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_minutes: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<Mode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        energy: Option<u8>,
        #[serde(default)]
        avoid_tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefer_priority: Option<Priority>,
    },
    DoAction {
        action: XpAction,
    },
    DayEnd {
        completed: u32,
        planned: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reflection: Option<String>,
    },
}

impl EventKind {
    /// Wire name of the variant (`app_open`, `do_next`, ...).
    pub fn type_name(&self) -> &'static str {
        self.into()
    }

    pub fn is_known_type(name: &str) -> bool {
        Self::VARIANTS.contains(&name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HandlerId {
    Greeting,
    CheckIn,
    NextTask,
    Progress,
    Reflection,
}

/// Total over every event variant.
pub fn route(kind: &EventKind) -> HandlerId {
    match kind {
        EventKind::AppOpen { .. } => HandlerId::Greeting,
        EventKind::CheckInSubmitted { .. } => HandlerId::CheckIn,
        EventKind::DoNext { .. } => HandlerId::NextTask,
        EventKind::DoAction { .. } => HandlerId::Progress,
        EventKind::DayEnd { .. } => HandlerId::Reflection,
    }
}
