//! One booth session, end to end.
//!
//! validate → submit → poll → composite → publish. Compositing and publishing
//! degrade instead of failing: without a composite the raw generated image is
//! shown, and without a published URL the composite is shown inline with QR
//! sharing disabled.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::error::BoothError;
use crate::models::artifact::Delivery;
use crate::models::generation::{GenerationDraft, MultiSwapDraft};
use crate::models::job::{Job, JobKind, JobOutcome};
use crate::services::compositor::{Compositor, ImageSource};
use crate::services::generation::GenerationBackend;
use crate::services::poller::Poller;
use crate::services::publisher::ArtifactPublisher;

pub struct BoothPipeline {
    backend: Arc<dyn GenerationBackend>,
    poller: Poller,
    compositor: Arc<Compositor>,
    publisher: Arc<ArtifactPublisher>,
}

impl BoothPipeline {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        poller: Poller,
        compositor: Arc<Compositor>,
        publisher: Arc<ArtifactPublisher>,
    ) -> Self {
        Self {
            backend,
            poller,
            compositor,
            publisher,
        }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Run a single-subject session.
    pub async fn run(
        &self,
        draft: GenerationDraft,
        cancel: &CancellationToken,
    ) -> Result<Delivery, BoothError> {
        let request = draft.into_request()?;
        let (width, height) = request.ratio.dimensions();

        let started = Instant::now();
        let job = self.backend.submit(&request).await?;
        metrics::counter!("booth_jobs_submitted_total").increment(1);
        tracing::info!(
            job_id = %job.id,
            filter_id = request.filter_id,
            gender = %request.gender,
            ratio = %request.ratio,
            "Booth session started"
        );

        let job = self.await_job(JobKind::FaceSwap, &job.id, started, cancel).await?;
        self.deliver(&job, width, height).await
    }

    /// Run a multi-subject session.
    pub async fn run_multi_swap(
        &self,
        draft: MultiSwapDraft,
        cancel: &CancellationToken,
    ) -> Result<Delivery, BoothError> {
        let (width, height) = draft.ratio().dimensions();
        let request = draft.into_request()?;

        let started = Instant::now();
        let job = self.backend.submit_multi_swap(&request).await?;
        metrics::counter!("booth_jobs_submitted_total").increment(1);
        tracing::info!(job_id = %job.id, style_id = request.style_id, "Multi-swap session started");

        let job = self.await_job(JobKind::MultiSwap, &job.id, started, cancel).await?;
        self.deliver(&job, width, height).await
    }

    async fn await_job(
        &self,
        kind: JobKind,
        job_id: &str,
        started: Instant,
        cancel: &CancellationToken,
    ) -> Result<Job, BoothError> {
        let result = self
            .poller
            .wait(self.backend.as_ref(), kind, job_id, cancel)
            .await;

        match JobOutcome::of(&result) {
            JobOutcome::Completed => {
                metrics::counter!("booth_jobs_completed_total").increment(1);
                metrics::histogram!("booth_generation_seconds")
                    .record(started.elapsed().as_secs_f64());
            }
            JobOutcome::Failed => metrics::counter!("booth_jobs_failed_total").increment(1),
            JobOutcome::TimedOut => metrics::counter!("booth_jobs_timed_out_total").increment(1),
            JobOutcome::Cancelled => {
                tracing::info!(job_id, "Session cancelled while waiting for job");
            }
            JobOutcome::Errored => metrics::counter!("booth_jobs_failed_total").increment(1),
        }

        result
    }

    async fn deliver(&self, job: &Job, width: u32, height: u32) -> Result<Delivery, BoothError> {
        let generated = job.first_image().ok_or_else(|| {
            BoothError::Processing("Job completed without an output image".to_string())
        })?;
        let source = ImageSource::from_generated(generated);

        let artifact = match self.compositor.compose(&source, width, height).await {
            Ok(artifact) => artifact,
            Err(e) => {
                metrics::counter!("booth_composite_fallbacks_total").increment(1);
                tracing::warn!(job_id = %job.id, error = %e, "Compositing failed, showing generated image");
                return Ok(Delivery::local(source.display_url(), width, height, false));
            }
        };

        match self.publisher.publish(&artifact).await {
            Ok(published) => {
                tracing::info!(job_id = %job.id, url = %published.url, "Booth session delivered");
                Ok(Delivery::published(published, width, height))
            }
            Err(e) => {
                metrics::counter!("booth_publish_fallbacks_total").increment(1);
                tracing::warn!(job_id = %job.id, error = %e, "Publishing failed, serving composite inline");
                Ok(Delivery::local(artifact.to_data_uri(), width, height, true))
            }
        }
    }
}
