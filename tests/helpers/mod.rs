//! Test helpers for driving the router in-process.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use photo_booth::{
    app_state::AppState,
    error::BoothError,
    models::generation::{CatalogEntry, GenerationRequest, MultiSwapRequest},
    models::job::{Job, JobKind, JobOutput, JobStatus},
    routes,
    services::compositor::{Compositor, ImageSource},
    services::generation::GenerationBackend,
    services::poller::{ManualClock, PollSettings, Poller},
    services::storage::{BlobStore, StorageError},
};

pub const JOB_ID: &str = "job-42";
/// Status queries for this id fail upstream with a 404.
pub const MISSING_JOB_ID: &str = "missing";

/// Solid-color PNG, base64 encoded.
pub fn png_base64(width: u32, height: u32, color: [u8; 4]) -> String {
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
        .write_to(&mut png, ImageFormat::Png)
        .expect("encode test png");
    base64::engine::general_purpose::STANDARD.encode(png.into_inner())
}

/// Generation service double that records what it was sent and replays
/// queued status responses.
#[derive(Default)]
pub struct FakeGeneration {
    statuses: Mutex<VecDeque<Job>>,
    pub submitted: Mutex<Vec<GenerationRequest>>,
    pub submitted_multi: Mutex<Vec<MultiSwapRequest>>,
    status_calls: AtomicUsize,
}

impl FakeGeneration {
    pub fn with_statuses(statuses: Vec<Job>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len() + self.submitted_multi.lock().unwrap().len()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

pub fn job(status: JobStatus) -> Job {
    Job {
        id: JOB_ID.to_string(),
        status,
        output: None,
        error: None,
    }
}

pub fn completed(image: String) -> Job {
    Job {
        output: Some(JobOutput {
            images: vec![image],
        }),
        ..job(JobStatus::Completed)
    }
}

pub fn failed(message: &str) -> Job {
    Job {
        error: Some(message.to_string()),
        ..job(JobStatus::Failed)
    }
}

#[async_trait]
impl GenerationBackend for FakeGeneration {
    async fn list_filters(&self) -> Result<Vec<CatalogEntry>, BoothError> {
        Ok(vec![
            CatalogEntry {
                id: 117,
                name: "Viking".to_string(),
            },
            CatalogEntry {
                id: 118,
                name: "Astronaut".to_string(),
            },
        ])
    }

    async fn list_workflows(&self) -> Result<Vec<CatalogEntry>, BoothError> {
        Ok(vec![CatalogEntry {
            id: 30,
            name: "Quick Animated Single (V4)".to_string(),
        }])
    }

    async fn list_multi_swap_styles(&self) -> Result<serde_json::Value, BoothError> {
        Ok(serde_json::json!({ "1": "Retro", "2": "Noir" }))
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Job, BoothError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(job(JobStatus::Pending))
    }

    async fn submit_multi_swap(&self, request: &MultiSwapRequest) -> Result<Job, BoothError> {
        self.submitted_multi.lock().unwrap().push(request.clone());
        Ok(job(JobStatus::Pending))
    }

    async fn fetch_status(&self, _kind: JobKind, job_id: &str) -> Result<Job, BoothError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if job_id == MISSING_JOB_ID {
            return Err(BoothError::Upstream {
                status: 404,
                message: "job not found".to_string(),
            });
        }
        let mut job = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| job(JobStatus::Processing));
        job.id = job_id.to_string();
        Ok(job)
    }
}

/// Object store that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), data.to_vec(), content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.booth.test/{key}")
    }
}

pub struct TestApp {
    pub router: Router,
    pub generation: Arc<FakeGeneration>,
    pub store: Arc<MemoryStore>,
}

/// Router backed by fakes, with a transparent overlay and a clock that never
/// really sleeps.
pub fn build_test_app(generation: FakeGeneration) -> TestApp {
    let generation = Arc::new(generation);
    let store = Arc::new(MemoryStore::default());
    let overlay = ImageSource::Base64(png_base64(32, 48, [0, 0, 0, 0]));

    let state = AppState::new(
        generation.clone(),
        store.clone(),
        Compositor::new(reqwest::Client::new(), overlay),
        Poller::new(PollSettings::default(), Arc::new(ManualClock::default())),
        CancellationToken::new(),
    );

    TestApp {
        router: routes::router(state),
        generation,
        store,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn post_raw(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
