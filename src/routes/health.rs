use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub generation_api: ComponentHealth,
    pub overlay: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn ok(started: std::time::Instant) -> Self {
        Self {
            status: "ok".to_string(),
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            latency_ms: None,
            error: Some(message),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// GET /health: generation API reachability and overlay availability.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let generation_check = match state.generation.list_filters().await {
        Ok(_) => ComponentHealth::ok(start),
        Err(e) => {
            tracing::warn!(error = %e, "Generation API health check failed");
            ComponentHealth::error(e.to_string())
        }
    };

    let overlay_start = std::time::Instant::now();
    let overlay_check = match state.pipeline.compositor().check_overlay().await {
        Ok(_) => ComponentHealth::ok(overlay_start),
        Err(e) => {
            tracing::warn!(error = %e, "Overlay health check failed");
            ComponentHealth::error(e.to_string())
        }
    };

    let all_healthy = generation_check.is_ok() && overlay_check.is_ok();
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            generation_api: generation_check,
            overlay: overlay_check,
        },
    };

    (status_code, Json(response))
}
