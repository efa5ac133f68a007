#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use nextup::config::Config;
use nextup::core::router::{Event, EventKind, EventRouter};
use nextup::core::storage::{InMemoryStorage, LearningSnapshot, Storage, StorageFuture};
use nextup::core::types::{
    Candidate, GamificationState, Priority, UserProfile, XpAction, XpTransaction,
};
use nextup::error::StorageError;
use nextup::llm::{DisabledBackend, GenerativeBackend, ScriptedBackend};
use nextup::observability::{Observer, ObserverEvent, ObserverMetric};

pub const USER: &str = "u1";

/// Storage whose every call fails as unavailable.
pub struct FailingStorage;

impl FailingStorage {
    fn fail<'a, T: Send + 'a>() -> StorageFuture<'a, T> {
        Box::pin(async { Err(StorageError::unavailable("failing", "connection refused")) })
    }
}

impl Storage for FailingStorage {
    fn name(&self) -> &str {
        "failing"
    }

    fn get_candidates<'a>(&'a self, _user_id: &'a str) -> StorageFuture<'a, Vec<Candidate>> {
        Self::fail()
    }

    fn get_user_profile<'a>(&'a self, _user_id: &'a str) -> StorageFuture<'a, UserProfile> {
        Self::fail()
    }

    fn get_gamification_state<'a>(
        &'a self,
        _user_id: &'a str,
    ) -> StorageFuture<'a, Option<GamificationState>> {
        Self::fail()
    }

    fn save_gamification_state<'a>(
        &'a self,
        _state: &'a GamificationState,
    ) -> StorageFuture<'a, ()> {
        Self::fail()
    }

    fn append_xp_transaction<'a>(
        &'a self,
        _transaction: &'a XpTransaction,
    ) -> StorageFuture<'a, ()> {
        Self::fail()
    }

    fn save_learning_snapshot<'a>(
        &'a self,
        _snapshot: &'a LearningSnapshot,
    ) -> StorageFuture<'a, ()> {
        Self::fail()
    }
}

/// In-memory storage that refuses gamification state writes.
#[derive(Default)]
pub struct StateWriteFails {
    pub inner: InMemoryStorage,
}

impl Storage for StateWriteFails {
    fn name(&self) -> &str {
        "state_write_fails"
    }

    fn get_candidates<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, Vec<Candidate>> {
        self.inner.get_candidates(user_id)
    }

    fn get_user_profile<'a>(&'a self, user_id: &'a str) -> StorageFuture<'a, UserProfile> {
        self.inner.get_user_profile(user_id)
    }

    fn get_gamification_state<'a>(
        &'a self,
        user_id: &'a str,
    ) -> StorageFuture<'a, Option<GamificationState>> {
        self.inner.get_gamification_state(user_id)
    }

    fn save_gamification_state<'a>(
        &'a self,
        _state: &'a GamificationState,
    ) -> StorageFuture<'a, ()> {
        FailingStorage::fail()
    }

    fn append_xp_transaction<'a>(
        &'a self,
        transaction: &'a XpTransaction,
    ) -> StorageFuture<'a, ()> {
        self.inner.append_xp_transaction(transaction)
    }

    fn save_learning_snapshot<'a>(
        &'a self,
        snapshot: &'a LearningSnapshot,
    ) -> StorageFuture<'a, ()> {
        self.inner.save_learning_snapshot(snapshot)
    }
}

/// Observer that keeps every event for assertions.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
    metrics: Mutex<Vec<ObserverMetric>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn metrics(&self) -> Vec<ObserverMetric> {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn fallback_stages(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::FallbackUsed { stage, .. } => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &ObserverEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.push(metric.clone());
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Everything a pipeline test needs, wired around one router.
pub struct Harness {
    pub storage: Arc<InMemoryStorage>,
    pub observer: Arc<RecordingObserver>,
    pub router: EventRouter,
}

impl Harness {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::with_config(backend, &Config::default())
    }

    pub fn with_config(backend: Arc<dyn GenerativeBackend>, config: &Config) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let observer = Arc::new(RecordingObserver::default());
        let router = EventRouter::new(storage.clone(), backend, observer.clone(), config)
            .expect("router builds from config");
        Self {
            storage,
            observer,
            router,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledBackend))
    }

    pub fn scripted(texts: &[&str]) -> (Self, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::with_texts(texts.iter().copied()));
        (Self::new(backend.clone()), backend)
    }
}

pub fn at(ts: &str) -> DateTime<Utc> {
    ts.parse().expect("valid RFC 3339 timestamp")
}

/// t1 low/90min/2024-01-01 and t2 urgent/20min/2024-01-02.
pub fn two_tasks() -> Vec<Candidate> {
    vec![
        Candidate::new("t1", "Tidy the garage", Priority::Low)
            .with_duration(90)
            .with_created("2024-01-01"),
        Candidate::new("t2", "Ship the release", Priority::Urgent)
            .with_duration(20)
            .with_created("2024-01-02"),
    ]
}

pub fn do_next(ts: &str, max_minutes: u32) -> Event {
    Event::new(
        USER,
        at(ts),
        EventKind::DoNext {
            max_minutes: Some(max_minutes),
            mode: None,
            energy: None,
            avoid_tags: Vec::new(),
            prefer_priority: None,
        },
    )
}

pub fn complete_task(ts: &str, priority: Priority) -> Event {
    Event::new(
        USER,
        at(ts),
        EventKind::DoAction {
            action: XpAction::TaskCompleted {
                task_id: None,
                priority,
            },
        },
    )
}
