//! Webhook emergency dialer.
//!
//! Hands the call request to a telephony webhook which places the call.

use std::time::Duration;

use domain::services::{DialError, EmergencyCall, EmergencyDialer};
use reqwest::Client;

use crate::config::DialerConfig;
use crate::services::outbound::{build_client, post_json_with_retry, DeliveryError};

pub struct WebhookDialer {
    client: Client,
    url: String,
    max_retries: u32,
}

impl WebhookDialer {
    pub fn new(config: &DialerConfig) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: build_client(Duration::from_millis(config.timeout_ms))?,
            url: config.url.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait::async_trait]
impl EmergencyDialer for WebhookDialer {
    async fn dial(&self, call: &EmergencyCall) -> Result<(), DialError> {
        let attempts = post_json_with_retry(&self.client, &self.url, call, self.max_retries)
            .await
            .map_err(|e| match e {
                DeliveryError::Rejected { status } | DeliveryError::ServerError { status } => {
                    DialError::Rejected { status }
                }
                DeliveryError::Transport(msg) => DialError::Transport(msg),
            })?;

        tracing::info!(
            number = %call.number,
            session_id = %call.session_id,
            attempts = attempts,
            "Emergency call handed to dialer webhook"
        );
        Ok(())
    }
}
