//! Health check endpoint handlers.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// How long a probe waits for the engine lock.
const ENGINE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: EngineHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineHealth {
    pub zones_loaded: usize,
    pub in_danger_zone: bool,
    pub session_open: bool,
    pub zone_source: String,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Reports `degraded` while no zones are loaded; the engine still runs.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let (zones_loaded, in_danger_zone, session_open) = state
        .engine
        .try_with(ENGINE_PROBE_TIMEOUT, |engine, _| {
            (
                engine.zones().len(),
                engine.monitor().in_danger_zone(),
                engine.has_open_session(),
            )
        })
        .await
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(HealthResponse {
        status: if zones_loaded > 0 { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: EngineHealth {
            zones_loaded,
            in_danger_zone,
            session_open,
            zone_source: state.zones.source().describe(),
        },
    }))
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the engine is responsive.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    state
        .engine
        .try_with(ENGINE_PROBE_TIMEOUT, |_, _| ())
        .await
        .map(|()| {
            Json(StatusResponse {
                status: "ready".to_string(),
            })
        })
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}
