use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors surfaced by a booth session and the HTTP handlers in front of it.
///
/// Every variant ends up as a user-facing message with a retry action in the
/// kiosk, so the `Display` text is kept short and readable.
#[derive(Debug, thiserror::Error)]
pub enum BoothError {
    /// Required input was absent; raised before any network call.
    #[error("Missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    /// Input was present but carried a value we cannot use.
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// The request never produced an HTTP response (connect, DNS, timeout).
    #[error("Network request failed: {0}")]
    Transport(String),

    /// The upstream answered, but not with something usable (non-JSON body,
    /// missing job id, unexpected shape).
    #[error("Request failed: {0}")]
    Request(String),

    /// The upstream answered with a non-2xx status and a JSON error body.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The generation service reported the job as FAILED.
    #[error("{0}")]
    Processing(String),

    /// No terminal state was observed within the poll timeout.
    #[error("Polling timeout exceeded after {}ms", timeout.as_millis())]
    PollTimeout { timeout: Duration },

    /// A compositing source could not be fetched or decoded.
    #[error("Failed to load image {image}: {reason}")]
    ImageLoad { image: String, reason: String },

    #[error("Failed to encode composite: {0}")]
    Encode(String),

    /// Publishing to object storage failed.
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl BoothError {
    pub fn missing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BoothError::Validation {
            missing: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        BoothError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Failures worth another attempt: no response at all, or an upstream 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            BoothError::Transport(_) => true,
            BoothError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            BoothError::Validation { .. } => "VALIDATION_ERROR",
            BoothError::InvalidField { .. } => "INVALID_FIELD",
            BoothError::Transport(_) | BoothError::Request(_) => "REQUEST_ERROR",
            BoothError::Upstream { .. } => "UPSTREAM_ERROR",
            BoothError::Processing(_) => "PROCESSING_ERROR",
            BoothError::PollTimeout { .. } => "POLL_TIMEOUT",
            BoothError::ImageLoad { .. } => "IMAGE_LOAD_ERROR",
            BoothError::Encode(_) => "ENCODE_ERROR",
            BoothError::Upload(_) => "UPLOAD_ERROR",
            BoothError::Cancelled => "CANCELLED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BoothError::Validation { .. } | BoothError::InvalidField { .. } => {
                StatusCode::BAD_REQUEST
            }
            BoothError::Transport(_)
            | BoothError::Request(_)
            | BoothError::ImageLoad { .. }
            | BoothError::Upload(_) => StatusCode::BAD_GATEWAY,
            BoothError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BoothError::Processing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BoothError::PollTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BoothError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // nginx's "client closed request"
            BoothError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
            }
        }
    }
}

impl From<reqwest::Error> for BoothError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            BoothError::Transport(err.to_string())
        } else {
            BoothError::Request(err.to_string())
        }
    }
}

impl From<JsonRejection> for BoothError {
    fn from(rejection: JsonRejection) -> Self {
        BoothError::invalid("body", rejection.body_text())
    }
}

impl IntoResponse for BoothError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "Request rejected");
        }

        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_missing_field() {
        let err = BoothError::missing(["base64", "ratio"]);
        assert_eq!(err.to_string(), "Missing required fields: base64, ratio");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn processing_error_displays_server_message_verbatim() {
        let err = BoothError::Processing("low confidence".to_string());
        assert_eq!(err.to_string(), "low confidence");
        assert_eq!(err.code(), "PROCESSING_ERROR");
    }

    #[test]
    fn upstream_status_is_passed_through() {
        let err = BoothError::Upstream {
            status: 404,
            message: "job not found".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(!err.is_transient());

        let err = BoothError::Upstream {
            status: 503,
            message: "busy".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn only_network_and_server_failures_are_transient() {
        assert!(BoothError::Transport("connection reset".into()).is_transient());
        assert!(!BoothError::Request("non-JSON".into()).is_transient());
        assert!(!BoothError::Processing("failed".into()).is_transient());
        assert!(!BoothError::PollTimeout {
            timeout: Duration::from_secs(60)
        }
        .is_transient());
    }

    #[test]
    fn cancelled_maps_to_client_closed_request() {
        assert_eq!(BoothError::Cancelled.status_code().as_u16(), 499);
    }
}
