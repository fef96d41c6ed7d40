//! Emergency dialer abstraction.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::SessionTrigger;

/// Outbound emergency call request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyCall {
    pub number: String,
    pub session_id: Uuid,
    pub trigger: SessionTrigger,
    pub requested_at: DateTime<Utc>,
}

impl EmergencyCall {
    pub fn new(number: impl Into<String>, session_id: Uuid, trigger: SessionTrigger) -> Self {
        Self {
            number: number.into(),
            session_id,
            trigger,
            requested_at: Utc::now(),
        }
    }

    /// `tel:` URI for platforms that dial through a link handler.
    pub fn tel_uri(&self) -> String {
        format!("tel:{}", self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialError {
    #[error("Dialer transport error: {0}")]
    Transport(String),

    #[error("Dialer rejected the call with status {status}")]
    Rejected { status: u16 },
}

/// Places emergency calls.
#[async_trait::async_trait]
pub trait EmergencyDialer: Send + Sync {
    async fn dial(&self, call: &EmergencyCall) -> Result<(), DialError>;
}

/// Mock dialer for development and testing.
///
/// Logs and records calls but doesn't actually dial.
#[derive(Debug, Clone, Default)]
pub struct MockDialer {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    placed: Arc<Mutex<Vec<EmergencyCall>>>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Calls placed so far, shared between clones.
    pub fn placed(&self) -> Vec<EmergencyCall> {
        self.placed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl EmergencyDialer for MockDialer {
    async fn dial(&self, call: &EmergencyCall) -> Result<(), DialError> {
        if self.simulate_failure {
            tracing::warn!(session_id = %call.session_id, "Mock dialer simulating failure");
            return Err(DialError::Transport("Simulated failure".to_string()));
        }

        tracing::info!(
            number = %call.number,
            session_id = %call.session_id,
            trigger = call.trigger.label(),
            "Mock: Would dial emergency number"
        );
        self.placed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());
        Ok(())
    }
}
