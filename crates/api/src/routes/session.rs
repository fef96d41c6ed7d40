//! Escalation session endpoint handlers.
//!
//! Each action maps one-to-one onto an engine operation. Actions that do
//! not apply to the current session state are rejected with 409.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{EngineSnapshot, SessionSnapshot};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;

/// Current proximity and session state.
///
/// GET /api/v1/state
pub async fn get_state(State(state): State<AppState>) -> Json<EngineSnapshot> {
    Json(state.engine.snapshot().await)
}

/// Open a session without a zone entry.
///
/// POST /api/v1/session
pub async fn start_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let snapshot = state.engine.with(|engine, now| engine.start_manual(now)).await?;
    info!(session_id = %snapshot.session_id, "Manual escalation session opened");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// "I'm safe".
///
/// POST /api/v1/session/safe
pub async fn mark_safe(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.engine.with(|engine, now| engine.mark_safe(now)).await?;
    Ok(Json(snapshot))
}

/// "I need help": starts the alarm and the auto-SOS countdown.
///
/// POST /api/v1/session/help
pub async fn request_help(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state
        .engine
        .with(|engine, now| engine.request_help(now))
        .await?;
    Ok(Json(snapshot))
}

/// Silence the alarm and cancel the pending emergency call.
///
/// POST /api/v1/session/stop-alarm
pub async fn stop_alarm(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.engine.with(|engine, now| engine.stop_alarm(now)).await?;
    Ok(Json(snapshot))
}

/// Place the emergency call now.
///
/// POST /api/v1/session/sos
pub async fn trigger_sos(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state
        .engine
        .with(|engine, now| engine.trigger_sos(now))
        .await?;
    Ok(Json(snapshot))
}

/// Tear the open session down without an outcome.
///
/// DELETE /api/v1/session
pub async fn dismiss_session(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.engine.with(|engine, now| engine.dismiss(now)).await?;
    info!(session_id = %snapshot.session_id, "Escalation session dismissed");
    Ok(Json(snapshot))
}
