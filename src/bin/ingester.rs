//! Tidepool Ingester Binary
//!
//! Receives stream-trigger batches over HTTP, writes measurements to the
//! time-series store and archives raw events to object storage.

use tidepool::api::{self, ApiServerConfig};
use tidepool::clock::SystemClock;
use tidepool::config::ComponentFactory;
use tidepool::ingester::{Ingester, IngesterConfig};
use tidepool::sink::{ObjectStoreArchiver, TimeSeriesWriter};
use tidepool::telemetry::Telemetry;
use tidepool::Error;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Tidepool Ingester
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "HTTP_PORT", default_value = "8081")]
    http_port: u16,

    /// Maximum accepted batch size in bytes
    #[arg(long, default_value = "6291456")]
    max_body_size: usize,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _telemetry = Telemetry::init_for_component("tidepool-ingester", &args.log_level)?;

    info!("Starting Tidepool Ingester");

    let coordinates = ComponentFactory::table_coordinates_from_env()?;
    let region = ComponentFactory::region_from_env();
    let store = ComponentFactory::create_timeseries_store()?;
    let archive = ComponentFactory::create_archive_store()?;

    info!(
        database = %coordinates.database,
        table = %coordinates.table,
        region = %region,
        "Ingester configuration"
    );

    let clock = Arc::new(SystemClock::new());
    let ingester = Arc::new(Ingester::with_clock(
        IngesterConfig { region },
        Arc::new(TimeSeriesWriter::new(store, coordinates)),
        Arc::new(ObjectStoreArchiver::new(archive, clock.clone())),
        clock,
    ));

    let config = ApiServerConfig {
        http_port: args.http_port,
        max_body_size: args.max_body_size,
    };
    let router = api::build_ingest_router(ingester, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    info!(http_port = config.http_port, "Ingester ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")))?;

    info!("Ingester shutting down");

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

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    if *shutdown.borrow() {
        return;
    }
    let _ = shutdown.changed().await;
}
