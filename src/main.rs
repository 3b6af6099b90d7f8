//! Gatekeeper server binary

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use gatekeeper::api::{self, AppState};
use gatekeeper::error::{self, ErrorConfig};
use gatekeeper::observability::{self, LogFormat, ObservabilityConfig, SecurityEvent};
use gatekeeper::{security_event, AppConfig, ServiceRouter};

#[derive(Parser, Debug)]
#[command(name = "gatekeeper", version, about = "Minimal identity service")]
struct Cli {
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Log output format: pretty, json or compact (overrides LOG_FORMAT)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut obs_config = ObservabilityConfig::from_env();
    if let Some(format) = cli.log_format {
        obs_config.log_format = format;
    }
    observability::init(&obs_config)?;

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    error::init(ErrorConfig::for_environment(config.environment));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = api::router(AppState::from_config(config.clone())).with_service_layers(&config);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    security_event!(
        SecurityEvent::SystemStartup,
        environment = %config.environment,
        port = config.port,
        token_ttl_secs = config.token_ttl.as_secs(),
        "Server started"
    );
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    security_event!(SecurityEvent::SystemShutdown, "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
