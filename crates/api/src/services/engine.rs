//! Shared handle to the escalation engine.
//!
//! The engine itself is synchronous; the handle serializes access behind an
//! async mutex, feeds it the monotonic clock, drains its events into metrics
//! and wakes the escalation driver when the next deadline moves.

use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::models::EngineSnapshot;
use domain::services::{AlertSink, EngineSettings, EscalationEngine, ZoneIndex};
use tokio::sync::{Mutex, Notify};

use crate::middleware::metrics::record_engine_events;

pub type SharedEngine = EscalationEngine<Box<dyn AlertSink>>;

/// Current monotonic instant.
///
/// Read from the tokio clock so paused-time tests drive the deadlines.
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<Mutex<SharedEngine>>,
    wake: Arc<Notify>,
}

impl EngineHandle {
    pub fn new(index: ZoneIndex, settings: EngineSettings, sink: Box<dyn AlertSink>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(EscalationEngine::new(index, settings, sink))),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Runs `f` against the engine at the current instant.
    pub async fn with<R>(&self, f: impl FnOnce(&mut SharedEngine, Instant) -> R) -> R {
        let mut engine = self.engine.lock().await;
        let before = engine.next_deadline();

        let result = f(&mut engine, now());

        let events = engine.take_events();
        if !events.is_empty() {
            tracing::debug!(events = ?events, "Engine events");
            record_engine_events(&events);
        }
        if engine.next_deadline() != before {
            self.wake.notify_one();
        }
        result
    }

    /// Like [`with`](Self::with) but gives up when the lock is not acquired
    /// within `timeout`.
    pub async fn try_with<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut SharedEngine, Instant) -> R,
    ) -> Option<R> {
        tokio::time::timeout(timeout, self.with(f)).await.ok()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.with(|engine, now| engine.snapshot(now)).await
    }

    /// Signalled whenever the next deadline changes.
    pub fn wake(&self) -> &Notify {
        &self.wake
    }

    /// Tears the engine down for process exit.
    pub async fn shutdown(&self) {
        self.with(|engine, _| engine.shutdown()).await;
    }
}
