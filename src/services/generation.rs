use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;

use crate::error::BoothError;
use crate::models::generation::{catalog_from_map, CatalogEntry, GenerationRequest, MultiSwapRequest};
use crate::models::job::{validate_job_id, Job, JobKind, SubmittedJob};

/// Operations the booth needs from the image-generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn list_filters(&self) -> Result<Vec<CatalogEntry>, BoothError>;

    async fn list_workflows(&self) -> Result<Vec<CatalogEntry>, BoothError>;

    /// Multi-subject styles, passed through as the service returns them.
    async fn list_multi_swap_styles(&self) -> Result<serde_json::Value, BoothError>;

    async fn submit(&self, request: &GenerationRequest) -> Result<Job, BoothError>;

    async fn submit_multi_swap(&self, request: &MultiSwapRequest) -> Result<Job, BoothError>;

    async fn fetch_status(&self, kind: JobKind, job_id: &str) -> Result<Job, BoothError>;
}

/// HTTP client for the remote image-generation service.
pub struct GenerationClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl GenerationClient {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, BoothError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("photo-booth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, BoothError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, BoothError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        read_json(response).await
    }

    async fn submit_job<B: Serialize + ?Sized>(
        &self,
        kind: JobKind,
        body: &B,
    ) -> Result<Job, BoothError> {
        let value = self.post_json(kind.submit_path(), body).await?;
        let submitted: SubmittedJob = serde_json::from_value(value)
            .map_err(|e| BoothError::Request(format!("Unexpected submission response: {e}")))?;
        let job = Job::try_from(submitted)?;

        tracing::info!(job_id = %job.id, kind = %kind, "Generation job submitted");
        Ok(job)
    }
}

#[async_trait]
impl GenerationBackend for GenerationClient {
    async fn list_filters(&self) -> Result<Vec<CatalogEntry>, BoothError> {
        catalog_from_map(self.get_json("/v1/filters/").await?)
    }

    async fn list_workflows(&self) -> Result<Vec<CatalogEntry>, BoothError> {
        catalog_from_map(self.get_json("/v1/workflows/").await?)
    }

    async fn list_multi_swap_styles(&self) -> Result<serde_json::Value, BoothError> {
        self.get_json("/v4/multi_swap_styles/").await
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Job, BoothError> {
        self.submit_job(JobKind::FaceSwap, request).await
    }

    async fn submit_multi_swap(&self, request: &MultiSwapRequest) -> Result<Job, BoothError> {
        self.submit_job(JobKind::MultiSwap, request).await
    }

    async fn fetch_status(&self, kind: JobKind, job_id: &str) -> Result<Job, BoothError> {
        validate_job_id(job_id)?;
        let value = self
            .post_json(&kind.status_path(job_id), &serde_json::json!({}))
            .await?;

        serde_json::from_value(value)
            .map_err(|e| BoothError::Request(format!("Unexpected status response: {e}")))
    }
}

/// Decode a JSON body, mapping non-JSON bodies and non-2xx statuses to errors.
///
/// A body that is not JSON is an error whatever the status code says.
async fn read_json(response: Response) -> Result<serde_json::Value, BoothError> {
    let status = response.status();
    let url = response.url().path().to_string();
    let text = response.text().await?;

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        tracing::warn!(
            path = %url,
            status = status.as_u16(),
            body_len = text.len(),
            "Non-JSON response from generation service"
        );
        return Err(BoothError::Request(format!(
            "Received non-JSON response: {}",
            status.as_u16()
        )));
    };

    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Failed with status: {}", status.as_u16()));
        return Err(BoothError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    Ok(value)
}
