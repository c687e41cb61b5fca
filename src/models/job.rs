use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::BoothError;

/// Status of a generation job as reported by the remote service.
///
/// Unrecognised status strings are read as `Processing`: only a known
/// terminal status ends polling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "IN_QUEUE" => JobStatus::Pending,
            "PROCESSING" | "IN_PROGRESS" => JobStatus::Processing,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" | "CANCELLED" | "TIMED_OUT" => JobStatus::Failed,
            other => {
                tracing::debug!(status = other, "Unrecognised job status, treating as in progress");
                JobStatus::Processing
            }
        }
    }
}

impl JobStatus {
    /// No further transitions happen after a terminal status.
    pub fn is_terminal(self) -> bool {
        match self {
            JobStatus::Completed | JobStatus::Failed => true,
            JobStatus::Pending | JobStatus::Processing => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobOutput {
    #[serde(default)]
    pub images: Vec<String>,
}

/// A server-tracked unit of image-generation work.
///
/// Only the remote service mutates a job; locally it is observed, never edited,
/// apart from restoring the id when a status response omits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    #[serde(default)]
    pub id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// First generated image payload, if the job produced any.
    pub fn first_image(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.images.first())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Body returned by the submission endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedJob {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl TryFrom<SubmittedJob> for Job {
    type Error = BoothError;

    fn try_from(submitted: SubmittedJob) -> Result<Self, Self::Error> {
        let id = submitted.id.trim().to_string();
        if id.is_empty() {
            return Err(BoothError::Request(
                "Generation service returned an empty job id".to_string(),
            ));
        }

        if let Some(status) = submitted.status.as_deref() {
            tracing::debug!(job_id = %id, upstream_status = status, "Job accepted");
        }

        Ok(Job {
            id,
            status: JobStatus::Pending,
            output: None,
            error: None,
        })
    }
}

/// Which upstream job family a job id belongs to.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    FaceSwap,
    MultiSwap,
}

impl JobKind {
    pub fn submit_path(self) -> &'static str {
        match self {
            JobKind::FaceSwap => "/v1/run/face_swap",
            JobKind::MultiSwap => "/v3/run/multi_swap",
        }
    }

    pub fn status_path(self, job_id: &str) -> String {
        match self {
            JobKind::FaceSwap => format!("/v2/status/{job_id}"),
            JobKind::MultiSwap => format!("/v3/status_multi_swap/{job_id}"),
        }
    }
}

/// Local end state of waiting on a job. `TimedOut` and `Cancelled` never
/// exist server-side.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Failed,
    TimedOut,
    Cancelled,
    Errored,
}

impl JobOutcome {
    pub fn of(result: &Result<Job, BoothError>) -> Self {
        match result {
            Ok(_) => JobOutcome::Completed,
            Err(BoothError::Processing(_)) => JobOutcome::Failed,
            Err(BoothError::PollTimeout { .. }) => JobOutcome::TimedOut,
            Err(BoothError::Cancelled) => JobOutcome::Cancelled,
            Err(_) => JobOutcome::Errored,
        }
    }
}

/// Reject ids that would escape the status path segment.
pub fn validate_job_id(job_id: &str) -> Result<(), BoothError> {
    let valid = !job_id.is_empty()
        && job_id.len() <= 128
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(BoothError::invalid("job_id", format!("'{job_id}' is not a job id")))
    }
}
