//! Escalation state machine.
//!
//! `AwaitingResponse -> AlarmActive -> Resolved`. Deadlines are absolute
//! instants (start + window) so late or irregular polling never drifts.
//! A session that is polled late resolves every elapsed deadline in order.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{Outcome, Phase, SessionAction, SessionSnapshot, SessionTrigger};
use crate::services::alarm::AlarmKind;
use crate::services::alert_sink::AlertSink;

/// Default time the user has to answer before the alarm starts.
pub const DEFAULT_RESPONSE_WINDOW: Duration = Duration::from_secs(30);

/// Default alarm time before the emergency call is placed.
pub const DEFAULT_AUTO_SOS_WINDOW: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationTimings {
    pub response_window: Duration,
    pub auto_sos_window: Duration,
}

impl Default for EscalationTimings {
    fn default() -> Self {
        Self {
            response_window: DEFAULT_RESPONSE_WINDOW,
            auto_sos_window: DEFAULT_AUTO_SOS_WINDOW,
        }
    }
}

/// One run of the response / alarm / resolution protocol.
#[derive(Debug)]
pub struct EscalationSession {
    id: Uuid,
    trigger: SessionTrigger,
    timings: EscalationTimings,
    phase: Phase,
    outcome: Option<Outcome>,
    started_at: DateTime<Utc>,
    response_deadline: Option<Instant>,
    auto_sos_deadline: Option<Instant>,
}

impl EscalationSession {
    /// Opens a session in `AwaitingResponse`. A zone entry notifies the user.
    ///
    /// Every session starts with fresh deadlines from `now`.
    pub fn open(
        trigger: SessionTrigger,
        timings: EscalationTimings,
        now: Instant,
        sink: &mut dyn AlertSink,
    ) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            trigger,
            timings,
            phase: Phase::AwaitingResponse,
            outcome: None,
            started_at: Utc::now(),
            response_deadline: Some(now + timings.response_window),
            auto_sos_deadline: None,
        };

        info!(
            session_id = %session.id,
            trigger = session.trigger.label(),
            zone = session.trigger.zone_name().unwrap_or(""),
            response_secs = timings.response_window.as_secs(),
            "Escalation session opened"
        );

        if let SessionTrigger::ZoneEntry {
            zone_name,
            risk_level,
        } = &session.trigger
        {
            sink.notify(zone_name, *risk_level);
        }

        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn trigger(&self) -> &SessionTrigger {
        &self.trigger
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_resolved(&self) -> bool {
        self.phase == Phase::Resolved
    }

    /// Number of deadlines still armed.
    pub fn pending_timers(&self) -> usize {
        usize::from(self.response_deadline.is_some()) + usize::from(self.auto_sos_deadline.is_some())
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.response_deadline, self.auto_sos_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every deadline that has elapsed by `now`. Returns whether the
    /// phase changed.
    pub fn poll(&mut self, now: Instant, sink: &mut dyn AlertSink) -> bool {
        let before = self.phase;
        loop {
            match self.phase {
                Phase::AwaitingResponse => match self.response_deadline {
                    Some(deadline) if now >= deadline => {
                        info!(session_id = %self.id, "No response before deadline");
                        // Auto-SOS counts from the response deadline, not from
                        // when the poll happened to run.
                        self.enter_alarm(deadline, sink);
                    }
                    _ => break,
                },
                Phase::AlarmActive => match self.auto_sos_deadline {
                    Some(deadline) if now >= deadline => {
                        info!(session_id = %self.id, "Alarm unanswered, escalating to SOS");
                        self.escalate(sink);
                    }
                    _ => break,
                },
                Phase::Resolved => break,
            }
        }
        before != self.phase
    }

    /// "I'm safe". Only valid while awaiting a response.
    pub fn mark_safe(&mut self, sink: &mut dyn AlertSink) -> Result<(), DomainError> {
        self.expect_phase(SessionAction::MarkSafe, Phase::AwaitingResponse)?;
        self.resolve(Outcome::Safe, sink);
        Ok(())
    }

    /// "I need help". Skips the rest of the response window.
    pub fn request_help(&mut self, now: Instant, sink: &mut dyn AlertSink) -> Result<(), DomainError> {
        self.expect_phase(SessionAction::RequestHelp, Phase::AwaitingResponse)?;
        info!(session_id = %self.id, "Help requested");
        self.enter_alarm(now, sink);
        Ok(())
    }

    /// Silences the alarm and closes the session without calling out.
    pub fn stop_alarm(&mut self, sink: &mut dyn AlertSink) -> Result<(), DomainError> {
        self.expect_phase(SessionAction::StopAlarm, Phase::AlarmActive)?;
        self.resolve(Outcome::ManuallyStopped, sink);
        Ok(())
    }

    /// Places the emergency call immediately.
    pub fn trigger_sos(&mut self, sink: &mut dyn AlertSink) -> Result<(), DomainError> {
        self.expect_phase(SessionAction::TriggerSos, Phase::AlarmActive)?;
        info!(session_id = %self.id, "SOS triggered by user");
        self.escalate(sink);
        Ok(())
    }

    /// Dismisses the session: clears all deadlines and silences any alarm.
    pub fn teardown(&mut self, sink: &mut dyn AlertSink) {
        if self.phase == Phase::AlarmActive {
            sink.stop_alarm();
        }
        if !self.is_resolved() {
            warn!(session_id = %self.id, phase = %self.phase, "Escalation session dismissed before resolution");
        }
        self.response_deadline = None;
        self.auto_sos_deadline = None;
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            trigger: self.trigger.clone(),
            phase: self.phase,
            outcome: self.outcome,
            response_remaining_secs: self.response_deadline.map(|d| remaining_secs(d, now)),
            auto_sos_remaining_secs: self.auto_sos_deadline.map(|d| remaining_secs(d, now)),
            started_at: self.started_at,
        }
    }

    fn alarm_kind(&self) -> AlarmKind {
        match self.trigger {
            SessionTrigger::ZoneEntry { .. } => AlarmKind::ZoneEmergency,
            SessionTrigger::Manual => AlarmKind::ManualEmergency,
        }
    }

    fn expect_phase(&self, action: SessionAction, expected: Phase) -> Result<(), DomainError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DomainError::InvalidAction {
                action,
                phase: self.phase,
            })
        }
    }

    fn enter_alarm(&mut self, from: Instant, sink: &mut dyn AlertSink) {
        self.response_deadline = None;
        self.auto_sos_deadline = Some(from + self.timings.auto_sos_window);
        self.phase = Phase::AlarmActive;

        let playing = sink.play_alarm(self.alarm_kind());
        info!(
            session_id = %self.id,
            alarm_playing = playing,
            auto_sos_secs = self.timings.auto_sos_window.as_secs(),
            "Alarm phase started"
        );
    }

    fn escalate(&mut self, sink: &mut dyn AlertSink) {
        sink.trigger_emergency_call(self.id, &self.trigger);
        sink.stop_alarm();
        self.finish(Outcome::EscalatedToSos);
    }

    fn resolve(&mut self, outcome: Outcome, sink: &mut dyn AlertSink) {
        if self.phase == Phase::AlarmActive {
            sink.stop_alarm();
        }
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: Outcome) {
        self.response_deadline = None;
        self.auto_sos_deadline = None;
        self.phase = Phase::Resolved;
        self.outcome = Some(outcome);
        info!(session_id = %self.id, outcome = %outcome, "Escalation session resolved");
    }
}

fn remaining_secs(deadline: Instant, now: Instant) -> u64 {
    let remaining = deadline.saturating_duration_since(now);
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}
