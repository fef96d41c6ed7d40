//! Zone endpoint handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::{ListZonesQuery, ListZonesResponse, ZoneResponse};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;

/// Response after reloading the zone dataset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadZonesResponse {
    pub zone_count: usize,
    pub source: String,
}

/// List the loaded zones.
///
/// GET /api/v1/zones?minRisk=high&sort=risk
pub async fn list_zones(
    State(state): State<AppState>,
    Query(query): Query<ListZonesQuery>,
) -> Json<ListZonesResponse> {
    let zones: Vec<ZoneResponse> = state
        .engine
        .with(|engine, _| {
            engine
                .zones()
                .list(&query)
                .into_iter()
                .map(ZoneResponse::from)
                .collect()
        })
        .await;

    Json(ListZonesResponse {
        total: zones.len(),
        zones,
    })
}

/// Fetch the dataset again and swap it into the engine.
///
/// POST /api/v1/zones/reload
///
/// A failing source leaves the current zones in place.
pub async fn reload_zones(
    State(state): State<AppState>,
) -> Result<Json<ReloadZonesResponse>, ApiError> {
    let index = state.zones.try_load().await?;
    let zone_count = index.len();

    state
        .engine
        .with(|engine, _| engine.replace_zones(index))
        .await;
    info!(zones = zone_count, "Zone collection replaced");

    Ok(Json(ReloadZonesResponse {
        zone_count,
        source: state.zones.source().describe(),
    }))
}
