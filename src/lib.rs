#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Restaurant menu REST API.
//!
//! Menu CRUD, MySQL-backed image storage (upload, most-recent resolution,
//! deletion), a payment-intent passthrough, and a health probe. Uploaded
//! files are staged on disk for the duration of one request and removed on
//! every exit path; "most recent image" is decided purely by the stored
//! upload timestamp.

use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment-driven configuration.
pub mod config;
/// Connection pool construction and schema bootstrap.
pub mod db;
/// Error types exposed by this crate.
pub mod error;
/// Image ingestion, resolution, and lifecycle.
pub mod images;
/// Typed records and request bodies.
pub mod model;
/// Payment processor client and webhook verification.
pub mod payments;
/// HTTP route table and handlers.
pub mod routes;
/// Shared application state.
pub mod state;
/// Store adapter over the relational pool.
pub mod store;

pub use config::Config;
pub use error::{ApiError, StoreError};
pub use images::{ImageService, MAX_IMAGE_BYTES, StagedFile, StagingArea, UPLOAD_FIELD};
pub use model::{MenuItemSummary, MenuItemUpdate, NewMenuItem, StoredImage};
pub use payments::PaymentClient;
pub use routes::build_router;
pub use state::AppState;
pub use store::{MenuStore, SqlStore};

/// Loads configuration, connects to the store, and serves until SIGINT or
/// SIGTERM. An unreachable store logs and exits non-zero.
pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();
    let port = config.port;

    let pool = match db::connect(&config).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Failed to start server: {err}");
            std::process::exit(1);
        }
    };

    let state = AppState::new(config, pool);
    let app = routes::build_router(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind server address");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Server shutting down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
