//! Escalation engine.
//!
//! Owns the proximity monitor, at most one escalation session and the alert
//! sink. All methods take the current monotonic instant so callers control
//! the clock. Every action polls elapsed deadlines first, so an action that
//! arrives after a deadline sees the state the deadline produced.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::DomainError;
use crate::models::{
    EngineSnapshot, LocationErrorReport, LocationSample, Outcome, SampleRejection,
    SessionSnapshot, SessionTrigger, Transition, ZoneResponse,
};
use crate::services::alert_sink::AlertSink;
use crate::services::escalation::{EscalationSession, EscalationTimings};
use crate::services::proximity_monitor::ProximityMonitor;
use crate::services::zone_index::ZoneIndex;

/// Default suppression window for re-entering a zone just marked safe.
pub const DEFAULT_REENTRY_COOLDOWN: Duration = Duration::from_secs(120);

/// Default oldest fix still evaluated.
pub const DEFAULT_MAX_SAMPLE_AGE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub timings: EscalationTimings,
    /// Zero disables suppression.
    pub reentry_cooldown: Duration,
    /// Samples captured longer ago are dropped. Zero disables the check.
    pub max_sample_age: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timings: EscalationTimings::default(),
            reentry_cooldown: DEFAULT_REENTRY_COOLDOWN,
            max_sample_age: DEFAULT_MAX_SAMPLE_AGE,
        }
    }
}

/// Something the engine did, drained by the caller for metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ZoneEntered { zone_name: String },
    ZoneExited,
    SessionOpened { trigger: &'static str },
    SessionResolved { outcome: Outcome },
    SessionDismissed,
    EntrySuppressed { zone_name: String },
    SampleIgnored { reason: SampleRejection },
}

/// Result of evaluating one location sample.
#[derive(Debug, Clone, Default)]
pub struct LocationUpdate {
    pub transition: Option<Transition>,
    /// Session opened by this sample, if any.
    pub opened: Option<SessionSnapshot>,
    /// Set when the sample was dropped before evaluation.
    pub ignored: Option<SampleRejection>,
}

pub struct EscalationEngine<S> {
    monitor: ProximityMonitor,
    session: Option<EscalationSession>,
    settings: EngineSettings,
    sink: S,
    last_outcome: Option<Outcome>,
    last_safe_entry: Option<(String, Instant)>,
    /// Capture time of the newest accepted sample.
    last_captured_at: Option<DateTime<Utc>>,
    events: Vec<EngineEvent>,
}

impl<S: AlertSink> EscalationEngine<S> {
    pub fn new(index: ZoneIndex, settings: EngineSettings, sink: S) -> Self {
        Self {
            monitor: ProximityMonitor::new(index),
            session: None,
            settings,
            sink,
            last_outcome: None,
            last_safe_entry: None,
            last_captured_at: None,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn zones(&self) -> &ZoneIndex {
        self.monitor.index()
    }

    pub fn monitor(&self) -> &ProximityMonitor {
        &self.monitor
    }

    pub fn has_open_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Deadlines armed across the engine.
    pub fn pending_timers(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, EscalationSession::pending_timers)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(EscalationSession::next_deadline)
    }

    /// Events since the last drain.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Evaluates a sample; a zone entry opens a session.
    ///
    /// Stale or out-of-order samples are dropped and leave all state as it was.
    pub fn on_location(&mut self, sample: &LocationSample, now: Instant) -> LocationUpdate {
        self.poll(now);

        if let Some(reason) = self.sample_rejection(sample, Utc::now()) {
            warn!(
                reason = %reason,
                captured_at = ?sample.captured_at,
                last_captured_at = ?self.last_captured_at,
                "Location sample ignored"
            );
            self.events.push(EngineEvent::SampleIgnored { reason });
            return LocationUpdate {
                ignored: Some(reason),
                ..LocationUpdate::default()
            };
        }
        if let Some(captured_at) = sample.captured_at {
            self.last_captured_at = Some(captured_at);
        }

        let transition = self.monitor.on_location(sample);
        let mut opened = None;

        match &transition {
            Some(Transition::Entered(zone)) => {
                self.events.push(EngineEvent::ZoneEntered {
                    zone_name: zone.name.clone(),
                });
                if self.session.is_some() {
                    debug!(zone = %zone.name, "Zone entered while a session is open, not opening another");
                } else if self.in_cooldown(&zone.name, now) {
                    info!(
                        zone = %zone.name,
                        cooldown_secs = self.settings.reentry_cooldown.as_secs(),
                        "Re-entry suppressed after recent safe response"
                    );
                    self.events.push(EngineEvent::EntrySuppressed {
                        zone_name: zone.name.clone(),
                    });
                } else {
                    let trigger = SessionTrigger::ZoneEntry {
                        zone_name: zone.name.clone(),
                        risk_level: zone.risk_level,
                    };
                    opened = Some(self.open(trigger, now));
                }
            }
            Some(Transition::Exited) => self.events.push(EngineEvent::ZoneExited),
            None => {}
        }

        LocationUpdate {
            transition,
            opened,
            ignored: None,
        }
    }

    pub fn on_location_error(&self, report: &LocationErrorReport) {
        self.monitor.on_location_error(report);
    }

    /// Opens a session without a zone entry ("I need help" from idle).
    pub fn start_manual(&mut self, now: Instant) -> Result<SessionSnapshot, DomainError> {
        self.poll(now);
        if self.session.is_some() {
            return Err(DomainError::SessionAlreadyOpen);
        }
        Ok(self.open(SessionTrigger::Manual, now))
    }

    pub fn mark_safe(&mut self, now: Instant) -> Result<SessionSnapshot, DomainError> {
        self.act(now, |session, sink| session.mark_safe(sink))
    }

    pub fn request_help(&mut self, now: Instant) -> Result<SessionSnapshot, DomainError> {
        self.act(now, |session, sink| session.request_help(now, sink))
    }

    pub fn stop_alarm(&mut self, now: Instant) -> Result<SessionSnapshot, DomainError> {
        self.act(now, |session, sink| session.stop_alarm(sink))
    }

    pub fn trigger_sos(&mut self, now: Instant) -> Result<SessionSnapshot, DomainError> {
        self.act(now, |session, sink| session.trigger_sos(sink))
    }

    /// Tears down the open session without an outcome.
    pub fn dismiss(&mut self, now: Instant) -> Result<SessionSnapshot, DomainError> {
        self.poll(now);
        let mut session = self.session.take().ok_or(DomainError::NoSession)?;
        session.teardown(&mut self.sink);
        self.events.push(EngineEvent::SessionDismissed);
        Ok(session.snapshot(now))
    }

    /// Fires elapsed deadlines. Returns the outcome if the session resolved.
    pub fn poll(&mut self, now: Instant) -> Option<Outcome> {
        let session = self.session.as_mut()?;
        session.poll(now, &mut self.sink);
        self.archive_if_resolved(now).and_then(|s| s.outcome)
    }

    /// Swaps the zone collection; the current in-zone flag is kept.
    pub fn replace_zones(&mut self, index: ZoneIndex) {
        self.monitor.replace_index(index);
    }

    /// Tears down everything; used on process shutdown.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown(&mut self.sink);
        }
        self.sink.stop_alarm();
    }

    pub fn snapshot(&self, now: Instant) -> EngineSnapshot {
        EngineSnapshot {
            in_danger_zone: self.monitor.in_danger_zone(),
            active_zone: self.monitor.active_zone().map(ZoneResponse::from),
            session: self.session.as_ref().map(|s| s.snapshot(now)),
            last_outcome: self.last_outcome,
            zone_count: self.monitor.index().len(),
        }
    }

    fn open(&mut self, trigger: SessionTrigger, now: Instant) -> SessionSnapshot {
        let label = trigger.label();
        let session = EscalationSession::open(trigger, self.settings.timings, now, &mut self.sink);
        let snapshot = session.snapshot(now);
        self.session = Some(session);
        self.events.push(EngineEvent::SessionOpened { trigger: label });
        snapshot
    }

    fn act<F>(&mut self, now: Instant, action: F) -> Result<SessionSnapshot, DomainError>
    where
        F: FnOnce(&mut EscalationSession, &mut S) -> Result<(), DomainError>,
    {
        self.poll(now);
        let session = self.session.as_mut().ok_or(DomainError::NoSession)?;
        action(session, &mut self.sink)?;
        let snapshot = session.snapshot(now);
        self.archive_if_resolved(now);
        Ok(snapshot)
    }

    fn archive_if_resolved(&mut self, now: Instant) -> Option<SessionSnapshot> {
        if !self.session.as_ref().is_some_and(EscalationSession::is_resolved) {
            return None;
        }
        let session = self.session.take()?;
        let outcome = session.outcome();
        self.last_outcome = outcome;

        if let Some(outcome) = outcome {
            self.events.push(EngineEvent::SessionResolved { outcome });
            if outcome == Outcome::Safe {
                if let Some(zone) = session.trigger().zone_name() {
                    self.last_safe_entry = Some((zone.to_string(), now));
                }
            }
        }

        Some(session.snapshot(now))
    }

    fn sample_rejection(
        &self,
        sample: &LocationSample,
        wall_now: DateTime<Utc>,
    ) -> Option<SampleRejection> {
        let captured_at = sample.captured_at?;

        if self.last_captured_at.is_some_and(|last| captured_at < last) {
            return Some(SampleRejection::OutOfOrder);
        }

        let max_age = self.settings.max_sample_age;
        if !max_age.is_zero() {
            let age = wall_now.signed_duration_since(captured_at);
            if age.to_std().is_ok_and(|age| age > max_age) {
                return Some(SampleRejection::Stale);
            }
        }
        None
    }

    fn in_cooldown(&self, zone_name: &str, now: Instant) -> bool {
        let cooldown = self.settings.reentry_cooldown;
        if cooldown.is_zero() {
            return false;
        }
        matches!(
            &self.last_safe_entry,
            Some((zone, at)) if zone == zone_name && now.saturating_duration_since(*at) < cooldown
        )
    }
}
