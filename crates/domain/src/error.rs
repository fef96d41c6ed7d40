//! Domain error types.

use thiserror::Error;

use crate::models::{Phase, SessionAction};

/// Errors raised by the escalation engine.
///
/// None of these are fatal: the engine state is left unchanged when an
/// action is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("No escalation session is open")]
    NoSession,

    #[error("Cannot {action} while the session is {phase}")]
    InvalidAction { action: SessionAction, phase: Phase },

    #[error("An escalation session is already open")]
    SessionAlreadyOpen,
}
