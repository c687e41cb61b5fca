//! In-memory doubles for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::BoothError;
use crate::models::generation::{CatalogEntry, GenerationRequest, MultiSwapRequest};
use crate::models::job::{Job, JobKind, JobOutput, JobStatus};
use crate::services::generation::GenerationBackend;
use crate::services::storage::{BlobStore, StorageError};

pub const SCRIPTED_JOB_ID: &str = "job-1";

/// Generation backend that replays a fixed sequence of status responses.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<Job, BoothError>>>,
    repeat: Option<Job>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

fn job(status: JobStatus) -> Job {
    Job {
        id: SCRIPTED_JOB_ID.to_string(),
        status,
        output: None,
        error: None,
    }
}

fn completed(images: &[&str]) -> Job {
    Job {
        output: Some(JobOutput {
            images: images.iter().map(|s| s.to_string()).collect(),
        }),
        ..job(JobStatus::Completed)
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, step: Result<Job, BoothError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
        self
    }

    pub fn then_job(self, job: Job) -> Self {
        self.push(Ok(job))
    }

    pub fn then_status(self, status: JobStatus) -> Self {
        self.push(Ok(job(status)))
    }

    pub fn then_completed(self, images: &[&str]) -> Self {
        self.push(Ok(completed(images)))
    }

    pub fn then_failed(self, message: Option<&str>) -> Self {
        self.push(Ok(Job {
            error: message.map(str::to_string),
            ..job(JobStatus::Failed)
        }))
    }

    pub fn then_error(self, error: BoothError) -> Self {
        self.push(Err(error))
    }

    /// Once the script runs out, answer with `status` forever.
    pub fn forever(mut self, status: JobStatus) -> Self {
        self.repeat = Some(job(status));
        self
    }

    pub fn forever_completed(mut self, images: &[&str]) -> Self {
        self.repeat = Some(completed(images));
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn accept(&self) -> Result<Job, BoothError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(job(JobStatus::Pending))
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn list_filters(&self) -> Result<Vec<CatalogEntry>, BoothError> {
        Ok(vec![CatalogEntry {
            id: 118,
            name: "Astronaut".to_string(),
        }])
    }

    async fn list_workflows(&self) -> Result<Vec<CatalogEntry>, BoothError> {
        Ok(vec![CatalogEntry {
            id: 30,
            name: "Quick Animated Single (V4)".to_string(),
        }])
    }

    async fn list_multi_swap_styles(&self) -> Result<serde_json::Value, BoothError> {
        Ok(serde_json::json!({ "1": "Retro" }))
    }

    async fn submit(&self, _request: &GenerationRequest) -> Result<Job, BoothError> {
        self.accept()
    }

    async fn submit_multi_swap(&self, _request: &MultiSwapRequest) -> Result<Job, BoothError> {
        self.accept()
    }

    async fn fetch_status(&self, _kind: JobKind, _job_id: &str) -> Result<Job, BoothError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match (next, &self.repeat) {
            (Some(step), _) => step,
            (None, Some(job)) => Ok(job.clone()),
            (None, None) => Err(BoothError::Request("script exhausted".to_string())),
        }
    }
}

/// Blob store that keeps uploads in memory, or fails every upload.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
    pub fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Rejected { status: 503 });
        }
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((key.to_string(), data.to_vec(), content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://files.example.com/{key}")
    }
}
