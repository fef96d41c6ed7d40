//! HTTP push notification service.
//!
//! Posts danger-zone payloads to a push gateway which fans them out to the
//! user's devices.

use std::time::Duration;

use domain::services::{
    DangerZonePayload, NotificationPermission, NotificationResult, NotificationService,
};
use reqwest::Client;

use crate::config::NotificationsConfig;
use crate::services::outbound::{build_client, post_json_with_retry, DeliveryError};

pub struct HttpNotificationService {
    client: Client,
    url: String,
    max_retries: u32,
}

impl HttpNotificationService {
    pub fn new(config: &NotificationsConfig) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: build_client(Duration::from_millis(config.timeout_ms))?,
            url: config.url.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait::async_trait]
impl NotificationService for HttpNotificationService {
    async fn request_permission(&self) -> NotificationPermission {
        // The gateway holds its own device registrations; there is nothing to prompt.
        NotificationPermission::Granted
    }

    async fn send_danger_zone(&self, payload: &DangerZonePayload) -> NotificationResult {
        match post_json_with_retry(&self.client, &self.url, payload, self.max_retries).await {
            Ok(attempts) => {
                tracing::info!(
                    zone = %payload.zone_name,
                    risk_level = %payload.risk_level,
                    attempts = attempts,
                    "Danger zone notification sent"
                );
                NotificationResult::Sent
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    zone = %payload.zone_name,
                    "Failed to send danger zone notification"
                );
                NotificationResult::Failed(e.to_string())
            }
        }
    }
}
