//! Notification service for danger-zone alerts.
//!
//! Provides abstractions for showing a platform notification when the user
//! enters a danger zone. Delivery is permission-gated and best-effort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::RiskLevel;

/// Notification type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DangerZoneEntered,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::DangerZoneEntered => write!(f, "danger_zone_entered"),
        }
    }
}

/// Platform permission to show notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not decided yet; the user is asked on first use.
    #[default]
    Prompt,
    /// The platform cannot show notifications.
    Unsupported,
}

impl NotificationPermission {
    /// Parse permission from config string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "granted" => Some(NotificationPermission::Granted),
            "denied" => Some(NotificationPermission::Denied),
            "prompt" | "default" => Some(NotificationPermission::Prompt),
            "unsupported" => Some(NotificationPermission::Unsupported),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationPermission::Granted => write!(f, "granted"),
            NotificationPermission::Denied => write!(f, "denied"),
            NotificationPermission::Prompt => write!(f, "prompt"),
            NotificationPermission::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Notification payload for a danger-zone entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DangerZonePayload {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub zone_name: String,
    pub risk_level: RiskLevel,
    pub title: String,
    pub body: String,
    /// Replaces any earlier notification with the same tag.
    pub tag: String,
    pub timestamp: DateTime<Utc>,
}

impl DangerZonePayload {
    pub fn new(zone_name: impl Into<String>, risk_level: RiskLevel) -> Self {
        let zone_name = zone_name.into();
        Self {
            notification_type: NotificationType::DangerZoneEntered,
            title: "Danger zone alert".to_string(),
            body: format!(
                "You have entered {zone_name}, a {risk_level} risk area. Are you safe?"
            ),
            tag: "danger-zone".to_string(),
            zone_name,
            risk_level,
            timestamp: Utc::now(),
        }
    }
}

/// Transport failure while delivering a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification rejected with status {status}")]
    Rejected { status: u16 },

    #[error("Notification payload could not be encoded: {0}")]
    Encoding(String),
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was shown.
    Sent,
    /// Permission denied or unsupported; nothing was shown.
    Skipped,
    /// Notification sending failed (but was non-blocking).
    Failed(String),
}

/// Notification service trait for showing danger-zone notifications.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Asks the user for permission. Called at most once per undecided state.
    async fn request_permission(&self) -> NotificationPermission;

    /// Show a danger-zone notification.
    async fn send_danger_zone(&self, payload: &DangerZonePayload) -> NotificationResult;
}

#[async_trait::async_trait]
impl<T: NotificationService + ?Sized> NotificationService for Box<T> {
    async fn request_permission(&self) -> NotificationPermission {
        (**self).request_permission().await
    }

    async fn send_danger_zone(&self, payload: &DangerZonePayload) -> NotificationResult {
        (**self).send_danger_zone(payload).await
    }
}

/// Mock notification service for development and testing.
///
/// Logs notifications but doesn't actually send them.
#[derive(Debug, Clone)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    /// Answer given when permission is requested.
    pub permission_answer: NotificationPermission,
}

impl Default for MockNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotificationService {
    /// Create a new mock notification service.
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
            permission_answer: NotificationPermission::Granted,
        }
    }

    /// Create a mock service that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            permission_answer: NotificationPermission::Granted,
        }
    }

    /// Create a mock service whose permission prompt is refused.
    pub fn refusing() -> Self {
        Self {
            simulate_failure: false,
            permission_answer: NotificationPermission::Denied,
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn request_permission(&self) -> NotificationPermission {
        tracing::info!(
            answer = %self.permission_answer,
            "Mock: Would prompt for notification permission"
        );
        self.permission_answer
    }

    async fn send_danger_zone(&self, payload: &DangerZonePayload) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                zone = %payload.zone_name,
                "Mock notification service simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            zone = %payload.zone_name,
            risk_level = %payload.risk_level,
            title = %payload.title,
            "Mock: Would show danger_zone_entered notification"
        );

        NotificationResult::Sent
    }
}

/// Wraps a notification service with the platform permission state.
///
/// An undecided permission is requested once; concurrent callers wait for
/// the same answer.
pub struct GatedNotifier<N> {
    service: N,
    permission: Mutex<NotificationPermission>,
}

impl<N: NotificationService> GatedNotifier<N> {
    pub fn new(service: N, permission: NotificationPermission) -> Self {
        Self {
            service,
            permission: Mutex::new(permission),
        }
    }

    pub async fn permission(&self) -> NotificationPermission {
        *self.permission.lock().await
    }

    pub fn service(&self) -> &N {
        &self.service
    }

    /// Shows the notification if permitted.
    pub async fn notify(&self, payload: &DangerZonePayload) -> NotificationResult {
        let permission = {
            let mut permission = self.permission.lock().await;
            if *permission == NotificationPermission::Prompt {
                *permission = self.service.request_permission().await;
                tracing::info!(permission = %*permission, "Notification permission decided");
            }
            *permission
        };

        match permission {
            NotificationPermission::Granted => self.service.send_danger_zone(payload).await,
            other => {
                tracing::debug!(
                    permission = %other,
                    zone = %payload.zone_name,
                    "Notification skipped"
                );
                NotificationResult::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        answer: NotificationPermission,
        prompts: AtomicUsize,
        sent: AtomicUsize,
    }

    impl CountingService {
        fn answering(answer: NotificationPermission) -> Self {
            Self {
                answer,
                prompts: AtomicUsize::new(0),
                sent: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl NotificationService for CountingService {
        async fn request_permission(&self) -> NotificationPermission {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.answer
        }

        async fn send_danger_zone(&self, _payload: &DangerZonePayload) -> NotificationResult {
            self.sent.fetch_add(1, Ordering::SeqCst);
            NotificationResult::Sent
        }
    }

    fn payload() -> DangerZonePayload {
        DangerZonePayload::new("Delhi", RiskLevel::Critical)
    }

    #[test]
    fn test_notification_type_display() {
        assert_eq!(
            NotificationType::DangerZoneEntered.to_string(),
            "danger_zone_entered"
        );
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(
            NotificationPermission::parse("GRANTED"),
            Some(NotificationPermission::Granted)
        );
        assert_eq!(
            NotificationPermission::parse("default"),
            Some(NotificationPermission::Prompt)
        );
        assert_eq!(NotificationPermission::parse("maybe"), None);
    }

    #[test]
    fn test_danger_zone_payload_serialization() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["type"], "danger_zone_entered");
        assert_eq!(json["zoneName"], "Delhi");
        assert_eq!(json["riskLevel"], "critical");
        assert!(json["body"].as_str().unwrap().contains("Delhi"));
    }

    #[test]
    fn test_granted_sends() {
        let notifier = GatedNotifier::new(
            CountingService::answering(NotificationPermission::Denied),
            NotificationPermission::Granted,
        );
        let result = tokio_test::block_on(notifier.notify(&payload()));
        assert_eq!(result, NotificationResult::Sent);
        assert_eq!(notifier.service().prompts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_denied_and_unsupported_skip_silently() {
        for permission in [
            NotificationPermission::Denied,
            NotificationPermission::Unsupported,
        ] {
            let notifier = GatedNotifier::new(
                CountingService::answering(NotificationPermission::Granted),
                permission,
            );
            let result = tokio_test::block_on(notifier.notify(&payload()));
            assert_eq!(result, NotificationResult::Skipped);
            assert_eq!(notifier.service().sent.load(Ordering::SeqCst), 0);
            assert_eq!(notifier.service().prompts.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_prompt_requests_permission_once() {
        let notifier = GatedNotifier::new(
            CountingService::answering(NotificationPermission::Granted),
            NotificationPermission::Prompt,
        );
        tokio_test::block_on(async {
            assert_eq!(notifier.notify(&payload()).await, NotificationResult::Sent);
            assert_eq!(notifier.notify(&payload()).await, NotificationResult::Sent);
            assert_eq!(notifier.permission().await, NotificationPermission::Granted);
        });
        assert_eq!(notifier.service().prompts.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.service().sent.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_prompt_refused_is_remembered() {
        let notifier = GatedNotifier::new(MockNotificationService::refusing(), NotificationPermission::Prompt);
        tokio_test::block_on(async {
            assert_eq!(notifier.notify(&payload()).await, NotificationResult::Skipped);
            assert_eq!(notifier.permission().await, NotificationPermission::Denied);
        });
    }

    #[test]
    fn test_mock_failure_is_non_blocking() {
        let notifier = GatedNotifier::new(MockNotificationService::failing(), NotificationPermission::Granted);
        let result = tokio_test::block_on(notifier.notify(&payload()));
        assert!(matches!(result, NotificationResult::Failed(_)));
    }
}
