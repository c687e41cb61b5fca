use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::BoothError;
use crate::models::artifact::{CompositeArtifact, PublishedArtifact};
use crate::services::data_uri::DataUri;
use crate::services::storage::BlobStore;

const KEY_PREFIX: &str = "photobooth";

/// Uploads finished images to object storage and hands back public URLs.
pub struct ArtifactPublisher {
    store: Arc<dyn BlobStore>,
}

impl ArtifactPublisher {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Publish a composite as `ai-photobooth-<millis>.jpg`.
    pub async fn publish(&self, artifact: &CompositeArtifact) -> Result<PublishedArtifact, BoothError> {
        let file_name = format!("ai-photobooth-{}.jpg", Utc::now().timestamp_millis());
        self.put(&file_name, &artifact.bytes, artifact.content_type)
            .await
    }

    /// Publish an image submitted as a `data:` URI.
    pub async fn publish_data_uri(&self, uri: &str) -> Result<PublishedArtifact, BoothError> {
        let decoded = DataUri::parse(uri)?;
        let file_name = format!("upload.{}", decoded.extension());
        self.put(&file_name, &decoded.bytes, &decoded.mime).await
    }

    async fn put(
        &self,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<PublishedArtifact, BoothError> {
        // Unique directory per upload so identical file names never collide.
        let path = format!("{KEY_PREFIX}/{}/{file_name}", Uuid::new_v4());

        self.store
            .put(&path, bytes, content_type)
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Artifact upload failed");
                BoothError::Upload(e.to_string())
            })?;

        let url = self.store.public_url(&path);
        tracing::info!(path = %path, url = %url, bytes = bytes.len(), "Artifact published");

        Ok(PublishedArtifact { url, path })
    }
}
