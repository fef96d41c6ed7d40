use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use persistence::repositories::ZoneRepository;
use persistence::sources::create_source;
use zone_guard_api::app::create_app;
use zone_guard_api::config::Config;
use zone_guard_api::jobs::EscalationDriver;
use zone_guard_api::middleware::{init_metrics, logging::init_logging};
use zone_guard_api::services::{build_alert_sink, EngineHandle, OutboundTasks};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics()?;

    info!("Starting Zone Guard v{}", env!("CARGO_PKG_VERSION"));

    // Zone data; an unavailable source leaves the engine running with no zones
    let source_config = config.zone_source_config()?;
    let source = create_source(&source_config)?;
    let zones = ZoneRepository::new(source).with_test_zone(config.test_zone());
    let index = zones.load().await;
    info!(zones = index.len(), "Zone collection ready");

    let outbound = OutboundTasks::new();
    let sink = build_alert_sink(&config, outbound.clone())?;
    let engine = EngineHandle::new(index, config.engine_settings(), Box::new(sink));

    let driver = EscalationDriver::start(engine.clone(), config.countdown_tick());

    let app = create_app(config.clone(), engine.clone(), zones);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    driver.shutdown();
    driver.wait_for_shutdown(grace).await;
    engine.shutdown().await;
    if !outbound.drain(grace).await {
        warn!("Some notifications or emergency calls did not complete before exit");
    }

    info!("Zone Guard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
