//! Engine handle and the adapters behind the alert sink.

pub mod alarm_player;
pub mod alert_sink;
pub mod dialer;
pub mod engine;
pub mod notifier;
pub mod outbound;

pub use alarm_player::{build_alarm_player, CommandAlarmPlayer, ConsoleAlarmPlayer};
pub use alert_sink::{build_alert_sink, DispatchingAlertSink};
pub use dialer::WebhookDialer;
pub use engine::{EngineHandle, SharedEngine};
pub use notifier::HttpNotificationService;
pub use outbound::{DeliveryError, OutboundTasks};
