//! Whole-session endpoints: the server runs submit, poll, composite and
//! publish, and answers with what the kiosk should display.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::error::BoothError;
use crate::models::artifact::Delivery;
use crate::models::generation::{GenerationDraft, MultiSwapDraft};

/// POST /api/v1/booth/sessions
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<GenerationDraft>, JsonRejection>,
) -> Result<Json<Delivery>, BoothError> {
    let Json(draft) = payload?;
    let cancel = state.shutdown.child_token();
    // A dropped request future stops the polling loop.
    let _guard = cancel.clone().drop_guard();

    let delivery = state.pipeline.run(draft, &cancel).await?;
    Ok(Json(delivery))
}

/// POST /api/v1/booth/multi-swap
pub async fn create_multi_swap_session(
    State(state): State<AppState>,
    payload: Result<Json<MultiSwapDraft>, JsonRejection>,
) -> Result<Json<Delivery>, BoothError> {
    let Json(draft) = payload?;
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let delivery = state.pipeline.run_multi_swap(draft, &cancel).await?;
    Ok(Json(delivery))
}
