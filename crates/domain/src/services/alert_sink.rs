//! Alert sink abstraction.
//!
//! The sink is the only way the escalation engine produces externally
//! observable effects. It is owned by the engine; there is no global state.

use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::models::{RiskLevel, SessionTrigger};
use crate::services::alarm::AlarmKind;

/// Externally observable effects of the engine.
///
/// Every method is best-effort and infallible from the engine's point of
/// view: failures are logged by the implementation and never abort an
/// escalation.
pub trait AlertSink: Send {
    /// Starts the audible alarm. Returns whether any sound is playing.
    fn play_alarm(&mut self, kind: AlarmKind) -> bool;

    /// Stops the audible alarm. Idempotent.
    fn stop_alarm(&mut self);

    /// Platform notification for a zone entry. Skipped when not permitted.
    fn notify(&mut self, zone_name: &str, risk_level: RiskLevel);

    /// Places the outbound emergency call.
    fn trigger_emergency_call(&mut self, session_id: Uuid, trigger: &SessionTrigger);
}

impl<S: AlertSink + ?Sized> AlertSink for Box<S> {
    fn play_alarm(&mut self, kind: AlarmKind) -> bool {
        (**self).play_alarm(kind)
    }

    fn stop_alarm(&mut self) {
        (**self).stop_alarm()
    }

    fn notify(&mut self, zone_name: &str, risk_level: RiskLevel) {
        (**self).notify(zone_name, risk_level)
    }

    fn trigger_emergency_call(&mut self, session_id: Uuid, trigger: &SessionTrigger) {
        (**self).trigger_emergency_call(session_id, trigger)
    }
}

/// A call observed by [`RecordingAlertSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    PlayAlarm(AlarmKind),
    StopAlarm,
    Notify { zone_name: String, risk_level: RiskLevel },
    EmergencyCall { session_id: Uuid },
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<SinkCall>,
    alarm_active: bool,
}

/// Sink that records calls instead of acting on them.
///
/// Clones share the same record, so a test can keep one clone while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertSink {
    recorded: Arc<Mutex<Recorded>>,
    /// Simulate every alarm source failing.
    pub fail_playback: bool,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose alarm never plays.
    pub fn silent() -> Self {
        Self {
            recorded: Arc::default(),
            fail_playback: true,
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded)
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.with(|r| r.calls.clone())
    }

    pub fn alarm_active(&self) -> bool {
        self.with(|r| r.alarm_active)
    }

    pub fn emergency_calls(&self) -> usize {
        self.with(|r| {
            r.calls
                .iter()
                .filter(|c| matches!(c, SinkCall::EmergencyCall { .. }))
                .count()
        })
    }

    pub fn alarms_started(&self) -> usize {
        self.with(|r| {
            r.calls
                .iter()
                .filter(|c| matches!(c, SinkCall::PlayAlarm(_)))
                .count()
        })
    }
}

impl AlertSink for RecordingAlertSink {
    fn play_alarm(&mut self, kind: AlarmKind) -> bool {
        let fail = self.fail_playback;
        self.with(|r| {
            r.calls.push(SinkCall::PlayAlarm(kind));
            if !fail {
                r.alarm_active = true;
            }
        });
        !fail
    }

    fn stop_alarm(&mut self) {
        self.with(|r| {
            r.calls.push(SinkCall::StopAlarm);
            r.alarm_active = false;
        });
    }

    fn notify(&mut self, zone_name: &str, risk_level: RiskLevel) {
        self.with(|r| {
            r.calls.push(SinkCall::Notify {
                zone_name: zone_name.to_string(),
                risk_level,
            })
        });
    }

    fn trigger_emergency_call(&mut self, session_id: Uuid, _trigger: &SessionTrigger) {
        self.with(|r| r.calls.push(SinkCall::EmergencyCall { session_id }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_shares_state_between_clones() {
        let observer = RecordingAlertSink::new();
        let mut sink: Box<dyn AlertSink> = Box::new(observer.clone());

        assert!(sink.play_alarm(AlarmKind::ZoneEmergency));
        assert!(observer.alarm_active());

        sink.stop_alarm();
        sink.stop_alarm();
        assert!(!observer.alarm_active());
        assert_eq!(observer.calls().len(), 3);
    }

    #[test]
    fn test_silent_sink_reports_failed_playback() {
        let mut sink = RecordingAlertSink::silent();
        assert!(!sink.play_alarm(AlarmKind::ManualEmergency));
        assert!(!sink.alarm_active());
        assert_eq!(sink.alarms_started(), 1);
    }
}
