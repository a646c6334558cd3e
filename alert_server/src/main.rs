//! Alert Dashboard Server — data-quality alert review.
//!
//! Serves a browser dashboard over the monitoring alerts table in Snowflake.
//! Analysts log in with their own warehouse token, browse alerts by type and
//! snapshot date, inspect each table's trend, and record a disposition:
//! all clear (annotation only) or issue (Teams message, then annotation).

mod config;
mod dashboard;
mod events;
mod metrics;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::config::DashboardConfig;
use crate::routes::DashboardState;
use crate::services::session_service::SessionStore;
use crate::services::teams_service::TeamsNotifier;
use crate::services::warehouse::SnowflakeConnector;

#[derive(Parser)]
#[command(name = "alert-dashboard", about = "Data-quality alert review dashboard")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "DASHBOARD_PORT", default_value = "9090")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let cli = Cli::parse();

    tracing::info!("Starting Alert Dashboard...");

    // Warehouse settings are required before anything is served
    let config = DashboardConfig::from_env()?;
    tracing::info!(
        account = %config.account,
        database = %config.database,
        schema = %config.schema,
        warehouse = %config.warehouse,
        alerts_table = %config.alerts_table,
        "Warehouse configuration loaded"
    );

    let state = DashboardState {
        connector: Arc::new(SnowflakeConnector::new(config.clone())),
        notifier: Arc::new(TeamsNotifier::new(config.teams_webhook_url.clone())),
        sessions: Arc::new(SessionStore::new()),
        config,
    };

    let app = routes::dashboard_router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Initialize metrics
    metrics::init_metrics();

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("Alert Dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
