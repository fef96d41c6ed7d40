//! Common test utilities for integration tests.
//!
//! Builds the full router around an engine whose alert sink records calls
//! instead of playing sounds or dialing, and a zone file in a temp directory.

// Allow dead code in this module - not every integration test uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use domain::services::RecordingAlertSink;
use persistence::repositories::ZoneRepository;
use persistence::sources::FileZoneSource;
use tower::ServiceExt;
use zone_guard_api::{
    app::create_app,
    config::{
        AlarmConfig, Config, DialerConfig, EscalationConfig, LoggingConfig, NotificationsConfig,
        SecurityConfig, ServerConfig, ZonesConfig,
    },
    jobs::EscalationDriver,
    services::EngineHandle,
};

/// A critical zone at the origin, a high zone near Delhi and a low zone.
pub const DEFAULT_ZONES: &str = r#"[
    {"state": "Test Zone", "location": {"lat": 0.0, "lng": 0.0}, "riskLevel": "critical", "totalIncidents": 5},
    {"state": "Delhi", "location": {"lat": 28.6139, "lng": 77.2090}, "riskLevel": "high", "totalIncidents": 142},
    {"state": "Kerala", "location": {"lat": 8.5241, "lng": 76.9366}, "riskLevel": "low", "totalIncidents": 12}
]"#;

/// Test configuration with console providers.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Use random port
            request_timeout_secs: 30,
            shutdown_timeout_secs: 1,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        escalation: EscalationConfig {
            // Wake only at deadlines so paused-time tests stay exact
            countdown_tick_ms: 60_000,
            ..EscalationConfig::default()
        },
        zones: ZonesConfig::default(),
        alarm: AlarmConfig::default(),
        notifications: NotificationsConfig::default(),
        dialer: DialerConfig::default(),
    }
}

/// Running application plus handles for inspecting side effects.
pub struct TestApp {
    pub router: Router,
    pub engine: EngineHandle,
    pub sink: RecordingAlertSink,
    pub zones_path: PathBuf,
    driver: Option<EscalationDriver>,
}

impl TestApp {
    /// App with [`DEFAULT_ZONES`] loaded.
    pub async fn new() -> Self {
        Self::with_zones(Some(DEFAULT_ZONES)).await
    }

    /// App whose zone file holds `zones_json`, or does not exist for `None`.
    pub async fn with_zones(zones_json: Option<&str>) -> Self {
        let zones_path =
            std::env::temp_dir().join(format!("zone-guard-test-{}.json", uuid::Uuid::new_v4()));
        if let Some(json) = zones_json {
            tokio::fs::write(&zones_path, json).await.unwrap();
        }

        let config = test_config();
        let zones = ZoneRepository::new(Arc::new(FileZoneSource::new(&zones_path)));
        let index = zones.load().await;

        let sink = RecordingAlertSink::new();
        let engine = EngineHandle::new(index, config.engine_settings(), Box::new(sink.clone()));
        let router = create_app(config, engine.clone(), zones);

        Self {
            router,
            engine,
            sink,
            zones_path,
            driver: None,
        }
    }

    /// Starts the deadline driver.
    pub fn start_driver(&mut self) {
        let tick = test_config().countdown_tick();
        self.driver = Some(EscalationDriver::start(self.engine.clone(), tick));
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post(&self, uri: &str) -> Response {
        self.request(empty_request(Method::POST, uri)).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(empty_request(Method::GET, uri)).await
    }

    pub async fn send_location(&self, lat: f64, lng: f64) -> Response {
        self.request(json_request(
            Method::POST,
            "/api/v1/location",
            serde_json::json!({"lat": lat, "lng": lng}),
        ))
        .await
    }

    pub async fn state(&self) -> serde_json::Value {
        parse_response_body(self.get("/api/v1/state").await).await
    }

    pub async fn shutdown(mut self) {
        if let Some(driver) = self.driver.take() {
            driver.shutdown();
            driver.wait_for_shutdown(std::time::Duration::from_secs(1)).await;
        }
        let _ = tokio::fs::remove_file(&self.zones_path).await;
    }
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request without a body.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
