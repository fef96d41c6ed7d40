//! Escalation session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::zone::{RiskLevel, ZoneResponse};

/// Phase of an escalation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingResponse,
    AlarmActive,
    Resolved,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::AwaitingResponse => write!(f, "awaiting_response"),
            Phase::AlarmActive => write!(f, "alarm_active"),
            Phase::Resolved => write!(f, "resolved"),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Safe,
    EscalatedToSos,
    ManuallyStopped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Safe => write!(f, "safe"),
            Outcome::EscalatedToSos => write!(f, "escalated_to_sos"),
            Outcome::ManuallyStopped => write!(f, "manually_stopped"),
        }
    }
}

/// What opened a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionTrigger {
    #[serde(rename_all = "camelCase")]
    ZoneEntry {
        zone_name: String,
        risk_level: RiskLevel,
    },
    Manual,
}

impl SessionTrigger {
    pub fn zone_name(&self) -> Option<&str> {
        match self {
            SessionTrigger::ZoneEntry { zone_name, .. } => Some(zone_name),
            SessionTrigger::Manual => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionTrigger::ZoneEntry { .. } => "zone_entry",
            SessionTrigger::Manual => "manual",
        }
    }
}

/// User actions accepted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    MarkSafe,
    RequestHelp,
    StopAlarm,
    TriggerSos,
}

impl std::fmt::Display for SessionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionAction::MarkSafe => write!(f, "mark_safe"),
            SessionAction::RequestHelp => write!(f, "request_help"),
            SessionAction::StopAlarm => write!(f, "stop_alarm"),
            SessionAction::TriggerSos => write!(f, "trigger_sos"),
        }
    }
}

/// Point-in-time view of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub trigger: SessionTrigger,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// Whole seconds left in the response window, rounded up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_remaining_secs: Option<u64>,
    /// Whole seconds left before the automatic emergency call, rounded up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_sos_remaining_secs: Option<u64>,
    pub started_at: DateTime<Utc>,
}

/// Observable engine state exposed upward.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub in_danger_zone: bool,
    pub active_zone: Option<ZoneResponse>,
    pub session: Option<SessionSnapshot>,
    pub last_outcome: Option<Outcome>,
    pub zone_count: usize,
}
