//! Credential-hiding proxy for the generation service.
//!
//! `/api/eventstation?endpoint=<path>` lets the kiosk reach the upstream API
//! without ever seeing the bearer token. Only the endpoints the booth uses are
//! reachable; anything else is rejected so the proxy cannot be used as an
//! authenticated relay.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::BoothError;
use crate::models::generation::{GenerationDraft, MultiSwapDraft};
use crate::models::job::{validate_job_id, JobKind};

const DEFAULT_GET_ENDPOINT: &str = "/v1/filters/";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProxyResponse<T> {
    data: T,
}

fn respond<T: Serialize>(data: T) -> Response {
    Json(ProxyResponse { data }).into_response()
}

/// Upstream endpoints the proxy forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEndpoint {
    Filters,
    Workflows,
    MultiSwapStyles,
    FaceSwapRun,
    FaceSwapStatus(String),
    MultiSwapRun,
    MultiSwapStatus(String),
}

impl ProxyEndpoint {
    pub fn parse(endpoint: &str) -> Result<Self, BoothError> {
        let endpoint = endpoint.trim();
        let parsed = match endpoint {
            "/v1/filters/" => ProxyEndpoint::Filters,
            "/v1/workflows/" => ProxyEndpoint::Workflows,
            "/v4/multi_swap_styles/" => ProxyEndpoint::MultiSwapStyles,
            "/v1/run/face_swap" => ProxyEndpoint::FaceSwapRun,
            "/v3/run/multi_swap" => ProxyEndpoint::MultiSwapRun,
            other => {
                if let Some(job_id) = other.strip_prefix("/v2/status/") {
                    validate_job_id(job_id)?;
                    ProxyEndpoint::FaceSwapStatus(job_id.to_string())
                } else if let Some(job_id) = other.strip_prefix("/v3/status_multi_swap/") {
                    validate_job_id(job_id)?;
                    ProxyEndpoint::MultiSwapStatus(job_id.to_string())
                } else {
                    return Err(BoothError::invalid(
                        "endpoint",
                        format!("'{other}' is not a proxied endpoint"),
                    ));
                }
            }
        };
        Ok(parsed)
    }

    fn is_listing(&self) -> bool {
        matches!(
            self,
            ProxyEndpoint::Filters | ProxyEndpoint::Workflows | ProxyEndpoint::MultiSwapStyles
        )
    }
}

/// GET /api/eventstation: filter, workflow and multi-swap style listings.
pub async fn proxy_get(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, BoothError> {
    let endpoint = ProxyEndpoint::parse(query.endpoint.as_deref().unwrap_or(DEFAULT_GET_ENDPOINT))?;

    let response = match endpoint {
        ProxyEndpoint::Filters => respond(state.generation.list_filters().await?),
        ProxyEndpoint::Workflows => respond(state.generation.list_workflows().await?),
        ProxyEndpoint::MultiSwapStyles => respond(state.generation.list_multi_swap_styles().await?),
        other => {
            return Err(BoothError::invalid(
                "endpoint",
                format!("{other:?} must be called with POST"),
            ))
        }
    };

    Ok(response)
}

/// POST /api/eventstation: job submission and status queries.
///
/// Without an `endpoint` parameter the body is a single-subject submission.
pub async fn proxy_post(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    body: Bytes,
) -> Result<Response, BoothError> {
    let endpoint = match query.endpoint.as_deref().map(str::trim) {
        None | Some("") => ProxyEndpoint::FaceSwapRun,
        Some(endpoint) => ProxyEndpoint::parse(endpoint)?,
    };

    if endpoint.is_listing() {
        return Err(BoothError::invalid(
            "endpoint",
            format!("{endpoint:?} must be called with GET"),
        ));
    }

    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice::<serde_json::Value>(&body)
            .map_err(|e| BoothError::invalid("body", e.to_string()))?
    };

    let response = match endpoint {
        ProxyEndpoint::FaceSwapRun => {
            let draft: GenerationDraft = serde_json::from_value(payload)
                .map_err(|e| BoothError::invalid("body", e.to_string()))?;
            let request = draft.into_request()?;
            respond(state.generation.submit(&request).await?)
        }
        ProxyEndpoint::MultiSwapRun => {
            let draft: MultiSwapDraft = serde_json::from_value(payload)
                .map_err(|e| BoothError::invalid("body", e.to_string()))?;
            let request = draft.into_request()?;
            respond(state.generation.submit_multi_swap(&request).await?)
        }
        ProxyEndpoint::FaceSwapStatus(job_id) => {
            respond(state.generation.fetch_status(JobKind::FaceSwap, &job_id).await?)
        }
        ProxyEndpoint::MultiSwapStatus(job_id) => {
            respond(state.generation.fetch_status(JobKind::MultiSwap, &job_id).await?)
        }
        ProxyEndpoint::Filters | ProxyEndpoint::Workflows | ProxyEndpoint::MultiSwapStyles => {
            return Err(BoothError::invalid("endpoint", "listing endpoints use GET"));
        }
    };

    Ok(response)
}
