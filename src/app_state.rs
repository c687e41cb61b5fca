use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::error::BoothError;
use crate::services::{
    compositor::{Compositor, ImageSource},
    generation::{GenerationBackend, GenerationClient},
    pipeline::BoothPipeline,
    poller::{Poller, TokioClock},
    publisher::ArtifactPublisher,
    storage::{BlobStore, S3Store, StorageError},
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<dyn GenerationBackend>,
    pub publisher: Arc<ArtifactPublisher>,
    pub pipeline: Arc<BoothPipeline>,
    /// Cancelled on shutdown; sessions run on child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        generation: Arc<dyn GenerationBackend>,
        store: Arc<dyn BlobStore>,
        compositor: Compositor,
        poller: Poller,
        shutdown: CancellationToken,
    ) -> Self {
        let publisher = Arc::new(ArtifactPublisher::new(store));
        let pipeline = Arc::new(BoothPipeline::new(
            generation.clone(),
            poller,
            Arc::new(compositor),
            publisher.clone(),
        ));

        Self {
            generation,
            publisher,
            pipeline,
            shutdown,
        }
    }

    /// Wire up the real generation client, S3 store and overlay from config.
    pub fn from_config(config: &AppConfig, shutdown: CancellationToken) -> Result<Self, StartupError> {
        tracing::info!(base_url = %config.generation_api_url, "Initializing generation client");
        let generation = GenerationClient::new(
            &config.generation_api_url,
            &config.generation_api_token,
            config.http_timeout(),
        )?;

        tracing::info!(bucket = %config.storage_bucket, "Initializing object storage client");
        let store = S3Store::new(
            &config.storage_bucket,
            &config.storage_endpoint,
            &config.storage_access_key,
            &config.storage_secret_key,
            &config.storage_public_base_url,
        )?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(BoothError::from)?;
        let compositor = Compositor::new(http, ImageSource::from_location(&config.overlay_path));

        let poller = Poller::new(config.poll_settings(), Arc::new(TokioClock));

        Ok(Self::new(
            Arc::new(generation),
            Arc::new(store),
            compositor,
            poller,
            shutdown,
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Generation client setup failed: {0}")]
    Generation(#[from] BoothError),

    #[error("Storage setup failed: {0}")]
    Storage(#[from] StorageError),
}
