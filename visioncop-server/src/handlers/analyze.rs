//! Single-image analysis handler
//!
//! Handles POST /analyze: fingerprint, metadata and manipulation report for one upload.

use axum::{
    extract::{Multipart, State},
    Json,
};
use visioncop_core::{ImageHandle, ImageReport};

use super::blocking;
use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// Analyze one image
///
/// Accepts multipart/form-data with a **file** field. Returns the SHA3-256
/// digest, the 64-bit perceptual hash, dimensions, capture metadata and the
/// manipulation evidence for the image.
#[utoipa::path(
    post,
    path = "/analyze",
    tag = "Verification",
    request_body(content_type = "multipart/form-data", description = "Image to analyze"),
    responses(
        (status = 200, description = "Image report", content_type = "application/json"),
        (status = 400, description = "No file provided"),
        (status = 422, description = "Upload is not a decodable image")
    )
)]
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageReport>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;
    let file = fields.take_file("file")?;
    let name = file.display_name("upload");

    let verifier = state.verifier.clone();
    let report = blocking(move || {
        let image = ImageHandle::from_bytes(name, file.data)?;
        Ok(verifier.analyze(&image)?)
    })
    .await?;

    Ok(Json(report))
}
