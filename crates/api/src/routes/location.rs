//! Location provider endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{LocationErrorReport, LocationSampleRequest, LocationSampleResponse};
use shared::validation::sample_age_secs;
use tracing::debug;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Evaluate the latest device position.
///
/// Stale and out-of-order samples are acknowledged with `ignored` set and
/// change nothing.
///
/// POST /api/v1/location
pub async fn submit_location(
    State(state): State<AppState>,
    Json(request): Json<LocationSampleRequest>,
) -> Result<Json<LocationSampleResponse>, ApiError> {
    request.validate()?;

    if let Some(age_secs) = request.timestamp.and_then(sample_age_secs) {
        debug!(age_secs = age_secs, accuracy = ?request.accuracy, "Location sample received");
    }

    let sample = request.sample();
    let response = state
        .engine
        .with(|engine, now| {
            let update = engine.on_location(&sample, now);
            LocationSampleResponse {
                transition: update.transition.as_ref().map(|t| t.as_str().to_string()),
                in_danger_zone: engine.monitor().in_danger_zone(),
                active_zone: engine.monitor().active_zone().map(|z| z.name.clone()),
                session: update.opened,
                ignored: update.ignored,
            }
        })
        .await;

    Ok(Json(response))
}

/// Record a location provider failure. State stays frozen.
///
/// POST /api/v1/location/error
pub async fn report_location_error(
    State(state): State<AppState>,
    Json(report): Json<LocationErrorReport>,
) -> StatusCode {
    state
        .engine
        .with(|engine, _| engine.on_location_error(&report))
        .await;
    StatusCode::ACCEPTED
}
