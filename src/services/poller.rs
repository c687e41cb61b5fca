//! Job status polling.
//!
//! Polls a generation job at a fixed interval until the service reports a
//! terminal status or the timeout elapses. Polls are strictly sequential: the
//! next query is only issued after the previous one resolved and the interval
//! has been slept. Time is read through a [`Clock`] so simulations can run the
//! loop without real delays.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoothError;
use crate::models::job::{Job, JobKind, JobStatus};
use crate::services::generation::GenerationBackend;

/// Message used when the service marks a job FAILED without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Image processing failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    /// Consecutive transient failures tolerated before the error is returned.
    pub max_transient_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            timeout: Duration::from_millis(60_000),
            max_transient_failures: 0,
        }
    }
}

impl PollSettings {
    /// Upper bound on status queries issued before a timeout is declared.
    pub fn max_attempts(&self) -> u64 {
        let interval = self.interval.as_millis().max(1);
        let timeout = self.timeout.as_millis();
        (timeout.div_ceil(interval) + 1) as u64
    }
}

/// Time source for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when slept on or advanced explicitly.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

/// Waits for generation jobs to reach a terminal status.
#[derive(Clone)]
pub struct Poller {
    settings: PollSettings,
    clock: Arc<dyn Clock>,
}

impl Poller {
    pub fn new(settings: PollSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Poll `job_id` until COMPLETED (returns the job with its output), FAILED
    /// (`Processing` error), timeout (`PollTimeout`) or cancellation.
    pub async fn wait(
        &self,
        backend: &dyn GenerationBackend,
        kind: JobKind,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Job, BoothError> {
        let started = self.clock.now();
        let mut attempt: u32 = 0;
        let mut transient_failures: u32 = 0;

        while self.clock.now().duration_since(started) < self.settings.timeout {
            attempt += 1;
            metrics::counter!("booth_status_polls_total").increment(1);

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BoothError::Cancelled),
                polled = backend.fetch_status(kind, job_id) => polled,
            };

            match polled {
                Ok(mut job) => {
                    transient_failures = 0;
                    if job.id != job_id {
                        if !job.id.is_empty() {
                            tracing::warn!(
                                job_id,
                                reported_id = %job.id,
                                "Status response carried a different job id"
                            );
                        }
                        job.id = job_id.to_string();
                    }

                    match job.status {
                        JobStatus::Completed => {
                            tracing::info!(
                                job_id,
                                attempt,
                                elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64,
                                "Generation job completed"
                            );
                            return Ok(job);
                        }
                        JobStatus::Failed => {
                            let message = job
                                .error
                                .filter(|m| !m.trim().is_empty())
                                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                            tracing::warn!(job_id, attempt, error = %message, "Generation job failed");
                            return Err(BoothError::Processing(message));
                        }
                        JobStatus::Pending | JobStatus::Processing => {
                            tracing::debug!(job_id, attempt, status = %job.status, "Job not finished yet");
                        }
                    }
                }
                Err(e)
                    if e.is_transient()
                        && transient_failures < self.settings.max_transient_failures =>
                {
                    transient_failures += 1;
                    tracing::warn!(
                        job_id,
                        attempt,
                        transient_failures,
                        error = %e,
                        "Transient status poll failure, will retry"
                    );
                }
                Err(e) => {
                    tracing::error!(job_id, attempt, error = %e, "Status poll failed");
                    return Err(e);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BoothError::Cancelled),
                _ = self.clock.sleep(self.settings.interval) => {}
            }
        }

        tracing::warn!(
            job_id,
            attempts = attempt,
            timeout_ms = self.settings.timeout.as_millis() as u64,
            "Polling timeout exceeded"
        );
        Err(BoothError::PollTimeout {
            timeout: self.settings.timeout,
        })
    }
}
