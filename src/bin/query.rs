//! Tidepool Query Binary
//!
//! Serves parameterized metric queries against the time-series store.

use tidepool::api;
use tidepool::config::ComponentFactory;
use tidepool::query::QueryService;
use tidepool::telemetry::Telemetry;
use tidepool::Error;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// Tidepool Query Service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "HTTP_PORT", default_value = "8082")]
    http_port: u16,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _telemetry = Telemetry::init_for_component("tidepool-query", &args.log_level)?;

    info!("Starting Tidepool Query Service");

    let coordinates = ComponentFactory::table_coordinates_from_env()?;
    let store = ComponentFactory::create_timeseries_store()?;

    info!(table = %coordinates.qualified_name(), "Query configuration");

    let service = Arc::new(QueryService::new(coordinates, store));
    let router = api::build_query_router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.http_port));
    let listener = TcpListener::bind(addr).await?;

    info!(http_port = args.http_port, "Query service ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")))?;

    info!("Query service shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
