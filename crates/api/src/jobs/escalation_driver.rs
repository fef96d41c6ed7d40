//! Background task that fires escalation deadlines.
//!
//! Sleeps until the engine's earliest deadline, or one countdown tick while a
//! session is open, then polls the engine. Actions that move the deadlines
//! wake it early through the engine handle.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::services::EngineHandle;

pub struct EscalationDriver {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl EscalationDriver {
    /// Spawn the driver on the current runtime.
    pub fn start(engine: EngineHandle, tick: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(engine, tick, shutdown_rx));
        info!(tick_ms = tick.as_millis() as u64, "Escalation driver started");
        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signal the driver to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("Stopping escalation driver");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the driver task to finish with timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => info!("Escalation driver stopped"),
            Ok(Err(e)) => warn!("Escalation driver task panicked: {}", e),
            Err(_) => warn!("Escalation driver shutdown timed out after {:?}", timeout),
        }
    }
}

async fn run(engine: EngineHandle, tick: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        let wake = engine.wake().notified();
        tokio::pin!(wake);
        // Register before reading the deadline so no wake-up is lost.
        wake.as_mut().enable();

        let next_deadline = engine
            .with(|engine, now| {
                if let Some(outcome) = engine.poll(now) {
                    info!(outcome = %outcome, "Session resolved by deadline");
                }
                if let Some(session) = engine.snapshot(now).session {
                    debug!(
                        phase = %session.phase,
                        response_remaining_secs = ?session.response_remaining_secs,
                        auto_sos_remaining_secs = ?session.auto_sos_remaining_secs,
                        "Countdown"
                    );
                }
                engine.next_deadline()
            })
            .await;

        let wake_at = next_deadline.map(|deadline| {
            Instant::from_std(deadline).min(Instant::now() + tick)
        });

        tokio::select! {
            _ = sleep_until(wake_at) => {}
            _ = &mut wake => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{LocationSample, Outcome, RiskLevel, Zone};
    use domain::services::{EngineSettings, RecordingAlertSink, ZoneIndex};
    use shared::Coordinate;

    fn engine(sink: RecordingAlertSink) -> EngineHandle {
        let index = ZoneIndex::new(vec![Zone::new(
            "Test Zone",
            Coordinate::new(0.0, 0.0),
            RiskLevel::Critical,
            1,
        )]);
        EngineHandle::new(index, EngineSettings::default(), Box::new(sink))
    }

    /// Lets the driver task run until it parks again.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_escalates_untouched_session() {
        let sink = RecordingAlertSink::new();
        let engine = engine(sink.clone());
        let driver = EscalationDriver::start(engine.clone(), Duration::from_secs(1));
        settle().await;

        engine
            .with(|e, now| e.on_location(&LocationSample::new(0.0, 0.0), now))
            .await;
        settle().await;

        tokio::time::sleep(Duration::from_secs(29)).await;
        settle().await;
        assert_eq!(sink.alarms_started(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(sink.alarms_started(), 1);
        assert_eq!(sink.emergency_calls(), 0);

        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(sink.emergency_calls(), 1);
        assert!(!sink.alarm_active());
        assert_eq!(
            engine.with(|e, _| e.last_outcome()).await,
            Some(Outcome::EscalatedToSos)
        );

        driver.shutdown();
        driver.wait_for_shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_picks_up_rescheduled_deadline() {
        let sink = RecordingAlertSink::new();
        let engine = engine(sink.clone());
        let driver = EscalationDriver::start(engine.clone(), Duration::from_secs(60));
        settle().await;

        engine.with(|e, now| e.start_manual(now)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        engine.with(|e, now| e.request_help(now)).await.unwrap();
        settle().await;

        tokio::time::sleep(Duration::from_secs(19)).await;
        settle().await;
        assert_eq!(sink.emergency_calls(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(sink.emergency_calls(), 1);

        driver.shutdown();
        driver.wait_for_shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_driver_stops_when_idle() {
        let engine = engine(RecordingAlertSink::new());
        let driver = EscalationDriver::start(engine, Duration::from_secs(1));
        settle().await;

        driver.shutdown();
        driver.wait_for_shutdown(Duration::from_secs(1)).await;
    }
}
