//! # sensorhubd: sensorhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the simulated sensor gateway (driven adapter)
//! - Construct the source registry, broadcast hub and aggregation controller
//! - Re-enable the sensors listed in the configuration
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT), stopping every sensor task
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sensorhub_adapter_http_axum::state::AppState;
use sensorhub_adapter_simulated::SimulatedGateway;
use sensorhub_app::controller::AggregationController;
use sensorhub_app::hub::BroadcastHub;
use sensorhub_app::registry::SourceRegistry;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Sensors
    let gateway = Arc::new(SimulatedGateway::new(&config.simulation));
    let registry = SourceRegistry::new(gateway, config.registry_config());
    let hub = Arc::new(BroadcastHub::new(registry, config.hub.channel_capacity));

    // Use-case
    let controller = Arc::new(AggregationController::new(hub));
    let wanted = config.dashboard.enabled_sensors.len();
    let enabled = controller
        .restore(config.dashboard.enabled_sensors.iter().cloned())
        .await;
    if wanted > 0 {
        tracing::info!(enabled, wanted, "restored configured sensors");
    }

    // HTTP
    let app = sensorhub_adapter_http_axum::router::build(AppState::from_arc(Arc::clone(
        &controller,
    )));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "sensorhubd listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    controller.shutdown().await;
    served.context("http server failed")?;

    tracing::info!("sensorhubd stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
