//! Stored images
//!
//! Lists, serves, reports on and removes the uploads kept by /index.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use visioncop_core::{ImageReport, IndexRecord};

use super::{blocking, image_url};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_stored_name;

/// One indexed image
#[derive(Serialize, ToSchema)]
pub struct StoredImage {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000.png")]
    pub id: String,
    #[schema(example = "/images/550e8400-e29b-41d4-a716-446655440000.png")]
    pub url: String,
    #[schema(value_type = String, example = "2026-01-07T10:00:00Z")]
    pub indexed_at: DateTime<Utc>,
    /// Forensic report taken at index time
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub report: Option<ImageReport>,
}

impl From<IndexRecord> for StoredImage {
    fn from(record: IndexRecord) -> Self {
        Self {
            url: image_url(&record.id),
            id: record.id,
            indexed_at: record.indexed_at,
            report: record.report,
        }
    }
}

/// Response for listing the index
#[derive(Serialize, ToSchema)]
pub struct ImageListResponse {
    /// Indexed images, sorted by id
    pub images: Vec<StoredImage>,
    #[schema(example = 42)]
    pub total: usize,
}

/// Response for removing an image
#[derive(Serialize, ToSchema)]
pub struct DeleteImageResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000.png")]
    pub id: String,
    /// Index size after removal
    #[schema(example = 41)]
    pub total: usize,
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Fetch a stored image
#[utoipa::path(
    get,
    path = "/images/{filename}",
    tag = "Images",
    params(("filename" = String, Path, description = "Stored file name returned by /index")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 400, description = "File name rejected"),
        (status = 404, description = "No such image")
    )
)]
pub async fn image_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_stored_name(&filename)?;
    let path = state.data_dir.join(name);

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(name))], bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found(format!("Image '{}' not found", name)))
        }
        Err(e) => Err(ApiError::internal(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// List indexed images
#[utoipa::path(
    get,
    path = "/images",
    tag = "Images",
    responses((status = 200, description = "Indexed images", body = ImageListResponse))
)]
pub async fn list_images_handler(State(state): State<AppState>) -> Json<ImageListResponse> {
    let images: Vec<StoredImage> = state
        .engine
        .records()
        .into_iter()
        .map(StoredImage::from)
        .collect();
    Json(ImageListResponse {
        total: images.len(),
        images,
    })
}

/// Forensic report stored for an indexed image
#[utoipa::path(
    get,
    path = "/images/{filename}/report",
    tag = "Images",
    params(("filename" = String, Path, description = "Stored file name returned by /index")),
    responses(
        (status = 200, description = "Report taken at index time", content_type = "application/json"),
        (status = 400, description = "File name rejected"),
        (status = 404, description = "Not indexed, or indexed without a report")
    )
)]
pub async fn image_report_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ImageReport>, ApiError> {
    let name = validate_stored_name(&filename)?;
    state
        .engine
        .record(name)
        .and_then(|record| record.report)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No report for '{}'", name)))
}

/// Remove an image from the index and delete its stored copy
#[utoipa::path(
    delete,
    path = "/images/{filename}",
    tag = "Images",
    params(("filename" = String, Path, description = "Stored file name returned by /index")),
    responses(
        (status = 200, description = "Image removed", body = DeleteImageResponse),
        (status = 400, description = "File name rejected"),
        (status = 404, description = "No such image"),
        (status = 500, description = "Index could not be written")
    )
)]
pub async fn delete_image_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteImageResponse>, ApiError> {
    let name = validate_stored_name(&filename)?.to_string();

    let engine = state.engine.clone();
    let key = name.clone();
    let was_indexed = blocking(move || Ok(engine.remove(&key)?)).await?;

    let path = state.data_dir.join(&name);
    let had_file = match tokio::fs::remove_file(&path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            return Err(ApiError::internal(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            )))
        }
    };

    if !was_indexed && !had_file {
        return Err(ApiError::not_found(format!("Image '{}' not found", name)));
    }

    tracing::info!(id = %name, was_indexed, had_file, "Removed image");
    Ok(Json(DeleteImageResponse {
        id: name,
        total: state.engine.len(),
    }))
}
