use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use persistence::repositories::ZoneRepository;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, location, session, zones};
use crate::services::EngineHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: EngineHandle,
    pub zones: ZoneRepository,
}

pub fn create_app(config: Config, engine: EngineHandle, zones: ZoneRepository) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        config: config.clone(),
        engine,
        zones,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Location provider, session controls and zone data (v1)
    let api_routes = Router::new()
        .route("/api/v1/location", post(location::submit_location))
        .route("/api/v1/location/error", post(location::report_location_error))
        .route("/api/v1/state", get(session::get_state))
        .route(
            "/api/v1/session",
            post(session::start_session).delete(session::dismiss_session),
        )
        .route("/api/v1/session/safe", post(session::mark_safe))
        .route("/api/v1/session/help", post(session::request_help))
        .route("/api/v1/session/stop-alarm", post(session::stop_alarm))
        .route("/api/v1/session/sos", post(session::trigger_sos))
        .route("/api/v1/zones", get(zones::list_zones))
        .route("/api/v1/zones/reload", post(zones::reload_zones));

    // Probes and metrics
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
