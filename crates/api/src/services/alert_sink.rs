//! Alert sink wired to the real alarm, notification and dialer backends.

use std::sync::Arc;

use domain::models::{RiskLevel, SessionTrigger};
use domain::services::{
    AlarmChannel, AlarmKind, AlertSink, DangerZonePayload, EmergencyCall, EmergencyDialer,
    GatedNotifier, MockDialer, MockNotificationService, NotificationPermission,
    NotificationService,
};
use uuid::Uuid;

use crate::config::Config;
use crate::middleware::metrics::{
    record_alarm_playback_failure, record_emergency_call, record_notification_result,
};
use crate::services::alarm_player::build_alarm_player;
use crate::services::dialer::WebhookDialer;
use crate::services::notifier::HttpNotificationService;
use crate::services::outbound::{DeliveryError, OutboundTasks};

/// Plays the alarm inline; notifications and calls run as background tasks
/// so the engine never waits on the network.
pub struct DispatchingAlertSink {
    alarm: AlarmChannel,
    notifier: Arc<GatedNotifier<Box<dyn NotificationService>>>,
    dialer: Arc<dyn EmergencyDialer>,
    emergency_number: String,
    outbound: OutboundTasks,
}

impl DispatchingAlertSink {
    pub fn new(
        alarm: AlarmChannel,
        notifications: Box<dyn NotificationService>,
        permission: NotificationPermission,
        dialer: Arc<dyn EmergencyDialer>,
        emergency_number: impl Into<String>,
        outbound: OutboundTasks,
    ) -> Self {
        Self {
            alarm,
            notifier: Arc::new(GatedNotifier::new(notifications, permission)),
            dialer,
            emergency_number: emergency_number.into(),
            outbound,
        }
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }
}

impl AlertSink for DispatchingAlertSink {
    fn play_alarm(&mut self, kind: AlarmKind) -> bool {
        let playing = self.alarm.play(kind);
        if !playing {
            record_alarm_playback_failure();
        }
        playing
    }

    fn stop_alarm(&mut self) {
        self.alarm.stop();
    }

    fn notify(&mut self, zone_name: &str, risk_level: RiskLevel) {
        let payload = DangerZonePayload::new(zone_name, risk_level);
        let notifier = Arc::clone(&self.notifier);
        self.outbound.spawn("danger_zone_notification", async move {
            let result = notifier.notify(&payload).await;
            record_notification_result(&result);
        });
    }

    fn trigger_emergency_call(&mut self, session_id: Uuid, trigger: &SessionTrigger) {
        let call = EmergencyCall::new(self.emergency_number.clone(), session_id, trigger.clone());
        tracing::warn!(
            number = %call.number,
            session_id = %session_id,
            trigger = trigger.label(),
            "Placing emergency call"
        );

        let dialer = Arc::clone(&self.dialer);
        self.outbound.spawn("emergency_call", async move {
            match dialer.dial(&call).await {
                Ok(()) => record_emergency_call(true),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        session_id = %call.session_id,
                        uri = %call.tel_uri(),
                        "Emergency call failed"
                    );
                    record_emergency_call(false);
                }
            }
        });
    }
}

/// Builds the alert sink from configuration.
pub fn build_alert_sink(
    config: &Config,
    outbound: OutboundTasks,
) -> Result<DispatchingAlertSink, DeliveryError> {
    let alarm = AlarmChannel::new(build_alarm_player(&config.alarm), config.sound_set());

    let notifications: Box<dyn NotificationService> = match config.notifications.provider.as_str() {
        "http" => Box::new(HttpNotificationService::new(&config.notifications)?),
        _ => Box::new(MockNotificationService::new()),
    };

    let dialer: Arc<dyn EmergencyDialer> = match config.dialer.provider.as_str() {
        "webhook" => Arc::new(WebhookDialer::new(&config.dialer)?),
        _ => Arc::new(MockDialer::new()),
    };

    tracing::info!(
        alarm_player = %config.alarm.player,
        notifications = %config.notifications.provider,
        dialer = %config.dialer.provider,
        "Alert sink configured"
    );

    Ok(DispatchingAlertSink::new(
        alarm,
        notifications,
        config.notification_permission(),
        dialer,
        config.escalation.emergency_number.clone(),
        outbound,
    ))
}
