//! Domain services for Zone Guard.
//!
//! Services contain the proximity and escalation logic that operates on
//! domain models, plus the seams to audio, notification and dialing.

pub mod alarm;
pub mod alert_sink;
pub mod dialer;
pub mod engine;
pub mod escalation;
pub mod notification;
pub mod proximity_monitor;
pub mod zone_index;

pub use alarm::{
    AlarmChannel, AlarmKind, AlarmPlayer, PlaybackError, SoundHandle, SoundSet, SoundSource,
};
pub use alert_sink::{AlertSink, RecordingAlertSink, SinkCall};
pub use dialer::{DialError, EmergencyCall, EmergencyDialer, MockDialer};
pub use engine::{
    EngineEvent, EngineSettings, EscalationEngine, LocationUpdate, DEFAULT_MAX_SAMPLE_AGE,
    DEFAULT_REENTRY_COOLDOWN,
};
pub use escalation::{
    EscalationSession, EscalationTimings, DEFAULT_AUTO_SOS_WINDOW, DEFAULT_RESPONSE_WINDOW,
};
pub use notification::{
    DangerZonePayload, GatedNotifier, MockNotificationService, NotificationError,
    NotificationPermission, NotificationResult, NotificationService, NotificationType,
};
pub use proximity_monitor::ProximityMonitor;
pub use zone_index::{radius_for, ZoneIndex};
