use std::{sync::Arc, time::Instant};

use sqlx::mysql::MySqlPool;

use crate::{
    config::Config,
    images::{ImageService, MAX_IMAGE_BYTES, StagingArea},
    payments::PaymentClient,
    store::{MenuStore, SqlStore},
};

/// Shared application state, constructed once at startup and handed to the
/// router behind an `Arc`.
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// Store handle used by the menu handlers.
    pub store: Arc<dyn MenuStore>,
    /// Image ingestion/resolution/lifecycle service.
    pub images: ImageService,
    /// Payment processor client; `None` when no secret key is configured.
    pub payments: Option<PaymentClient>,
    /// Process start time, reported by the health probe.
    pub started_at: Instant,
}

impl AppState {
    /// Builds state over a live MySQL pool.
    pub fn new(config: Config, pool: MySqlPool) -> Arc<Self> {
        Self::with_store(config, Arc::new(SqlStore::new(pool)))
    }

    /// Builds state over any store implementation; tests inject an
    /// in-memory double here.
    pub fn with_store(config: Config, store: Arc<dyn MenuStore>) -> Arc<Self> {
        let staging = StagingArea::new(&config.upload_dir, MAX_IMAGE_BYTES);
        let images = ImageService::new(store.clone(), staging);
        let payments = if config.stripe_secret_key.is_empty() {
            None
        } else {
            Some(PaymentClient::new(&config.stripe_secret_key))
        };

        Arc::new(Self {
            config,
            store,
            images,
            payments,
            started_at: Instant::now(),
        })
    }
}
