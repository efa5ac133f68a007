use super::traits::{Observer, ObserverEvent, ObserverMetric};
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes pipeline events through `tracing`.
pub struct LogObserver {
    event_count: AtomicU64,
    fallback_count: AtomicU64,
}

impl LogObserver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            event_count: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    fn snapshot_counts(&self) -> (u64, u64) {
        (
            self.event_count.load(Ordering::Relaxed),
            self.fallback_count.load(Ordering::Relaxed),
        )
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);
        match event {
            ObserverEvent::EventRouted { event, handler } => {
                tracing::info!(event, handler, "event.routed");
            }
            ObserverEvent::UnknownEvent { type_name } => {
                tracing::warn!(type_name = %type_name, "event.unknown");
            }
            ObserverEvent::SelectionAttempted {
                backend,
                candidates,
            } => {
                tracing::info!(backend = %backend, candidates, "selection.attempted");
            }
            ObserverEvent::SelectionCompleted { task_id, is_valid } => {
                tracing::info!(task_id = %task_id, is_valid, "selection.completed");
            }
            ObserverEvent::FallbackUsed { stage, reason } => {
                self.fallback_count.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(stage, reason = %reason, "fallback.used");
            }
            ObserverEvent::XpUpdated {
                user_id,
                xp_awarded,
                level,
                leveled_up,
            } => {
                tracing::info!(user_id = %user_id, xp_awarded, level, leveled_up, "xp.updated");
            }
            ObserverEvent::Error { component, message } => {
                tracing::warn!(component = %component, error = %message, "pipeline.error");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::GenerationLatency(d) => {
                let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
                tracing::info!(latency_ms = ms, "metric.generation_latency");
            }
            ObserverMetric::CandidatesScored(n) => {
                tracing::info!(count = n, "metric.candidates_scored");
            }
        }
    }

    fn flush(&self) {
        tracing::debug!(
            events_total = self.event_count.load(Ordering::Relaxed),
            fallbacks_total = self.fallback_count.load(Ordering::Relaxed),
            "observer.log.flush"
        );
    }

    fn name(&self) -> &str {
        "log"
    }
}
