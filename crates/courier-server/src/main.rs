//! Courier Broker Server
//!
//! Main entry point for the Courier message broker.
//!
//! ## Startup sequence
//! 1. Resolve configuration from the environment (and the optional
//!    `BROKER_CONFIG` JSON file).
//! 2. Bootstrap the on-disk layout (create or reuse the data root; honour
//!    the `reboot` flag).
//! 3. Materialise the broker: assignment map, ingress buffer and every
//!    partition replay their logs. Any structural problem here is fatal.
//! 4. Spawn the dispatch loop and serve the HTTP API.
//!
//! ## Configuration
//! - `PORT`: HTTP port (default: 8080)
//! - `BROKER_ID`: broker identifier (default: courier-1)
//! - `DATA_STORAGE_VOLUME`: data root directory (default: ./data)
//! - `INGRESS_LOG_FILE` / `INGRESS_METADATA_FILE`: ingress WAL/cursor file
//!   names under the data root
//! - `BROKER_CONFIG`: path to a JSON file with the topic layout and the
//!   `reboot` flag
//!
//! ## Logging
//! Controlled via `RUST_LOG`:
//! ```bash
//! RUST_LOG=debug cargo run -p courier-server
//! ```

use courier_server::{bootstrap, AppState, Broker, BrokerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = BrokerConfig::load_from_env().await?;
    tracing::info!(
        broker = %config.broker_id,
        data_root = %config.data_root.display(),
        port = config.port,
        "starting Courier broker"
    );

    let topics = bootstrap(&config).await?;
    let broker = Broker::open(&config.broker_id, &config.storage(), &topics).await?;

    let dispatch = broker.spawn_dispatch_loop();

    let state = AppState {
        broker: broker.clone(),
    };
    let router = courier_server::create_router(state);

    courier_server::serve(router, config.port, shutdown_signal()).await?;

    // Push any staged ingress writes to disk before exiting.
    dispatch.abort();
    if let Err(e) = broker.ingress().flush().await {
        tracing::error!(error = %e, "final ingress flush failed");
    }

    tracing::info!("Courier broker shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
