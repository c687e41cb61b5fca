use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::BoothError;
use crate::models::artifact::PublishedArtifact;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// `data:<mime>;base64,<payload>`
    pub image: Option<String>,
}

/// POST /api/upload: store a data-URI image and return its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<PublishedArtifact>, BoothError> {
    let Json(request) = payload?;
    let image = request
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| BoothError::missing(["image"]))?;

    let published = state.publisher.publish_data_uri(&image).await?;
    Ok(Json(published))
}
