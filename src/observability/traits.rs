use std::time::Duration;

/// Named pipeline boundaries reported to an [`Observer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    EventRouted {
        event: &'static str,
        handler: &'static str,
    },
    UnknownEvent {
        type_name: String,
    },
    SelectionAttempted {
        backend: String,
        candidates: usize,
    },
    SelectionCompleted {
        task_id: String,
        is_valid: bool,
    },
    /// A guarded step returned its deterministic fallback.
    FallbackUsed {
        stage: &'static str,
        reason: String,
    },
    XpUpdated {
        user_id: String,
        xp_awarded: u32,
        level: u32,
        leveled_up: bool,
    },
    Error {
        component: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverMetric {
    GenerationLatency(Duration),
    CandidatesScored(u64),
}

/// Passive sink for pipeline events. The pipeline behaves the same with any
/// observer, including none.
pub trait Observer: Send + Sync {
    fn record_event(&self, event: &ObserverEvent);

    fn record_metric(&self, metric: &ObserverMetric);

    fn flush(&self) {}

    fn name(&self) -> &str;
}
