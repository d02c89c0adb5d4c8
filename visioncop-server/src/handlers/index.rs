//! Indexing handler
//!
//! Handles POST /index: stores uploads under generated names and adds them to the vector index.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use visioncop_core::{ImageHandle, ImageReport};

use super::{blocking, image_url};
use crate::error::ApiError;
use crate::multipart::{FileField, MultipartFields};
use crate::state::AppState;
use crate::validation::image_extension;

/// One image added to the index
#[derive(Serialize, ToSchema)]
pub struct IndexedImage {
    /// Index id, also the stored file name
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000.png")]
    pub id: String,
    /// File name sent by the client
    #[schema(example = "holiday.png")]
    pub filename: String,
    /// Where the stored copy is served
    #[schema(example = "/images/550e8400-e29b-41d4-a716-446655440000.png")]
    pub url: String,
    #[schema(value_type = String, example = "2026-01-07T10:00:00Z")]
    pub indexed_at: DateTime<Utc>,
    /// Forensic report stored with the entry
    #[schema(value_type = Object)]
    pub report: ImageReport,
}

/// Response for indexing
#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    pub indexed: Vec<IndexedImage>,
    /// Index size after this request
    #[schema(example = 43)]
    pub total: usize,
}

/// Add images to the search index
///
/// Accepts multipart/form-data with one or more **file** fields. Each upload
/// is stored in the data directory under a generated name and embedded into
/// the vector index under that name, together with its forensic report.
#[utoipa::path(
    post,
    path = "/index",
    tag = "Search",
    request_body(content_type = "multipart/form-data", description = "Images to index"),
    responses(
        (status = 201, description = "Images indexed", body = IndexResponse),
        (status = 400, description = "No file provided or not a supported image"),
        (status = 422, description = "No embedding could be extracted"),
        (status = 500, description = "Storage or index failure")
    )
)]
pub async fn index_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;
    let files = fields.take_files("file");
    if files.is_empty() {
        return Err(ApiError::bad_request(
            "No file provided. Use 'file' field in multipart form.",
        ));
    }

    // Reject the whole request before anything is stored
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        let ext = image_extension(&file.data).ok_or_else(|| {
            ApiError::bad_request(format!(
                "'{}' is not a supported image (jpeg, png, gif, webp, bmp, tiff)",
                file.display_name("upload")
            ))
        })?;
        uploads.push((format!("{}.{}", Uuid::new_v4(), ext), file));
    }

    tokio::fs::create_dir_all(&state.data_dir).await.map_err(|e| {
        ApiError::internal(format!(
            "Failed to create {}: {}",
            state.data_dir.display(),
            e
        ))
    })?;

    let mut indexed = Vec::with_capacity(uploads.len());
    for (id, file) in uploads {
        indexed.push(store_and_index(&state, id, file).await?);
    }

    tracing::info!(count = indexed.len(), total = state.engine.len(), "Indexed uploads");

    Ok((
        StatusCode::CREATED,
        Json(IndexResponse {
            indexed,
            total: state.engine.len(),
        }),
    ))
}

async fn store_and_index(
    state: &AppState,
    id: String,
    file: FileField,
) -> Result<IndexedImage, ApiError> {
    let filename = file.display_name("upload");
    let path = state.data_dir.join(&id);

    tokio::fs::write(&path, &file.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to write {}: {}", path.display(), e)))?;

    let engine = state.engine.clone();
    let verifier = state.verifier.clone();
    let key = id.clone();
    let name = filename.clone();
    let result = blocking(move || {
        let image = ImageHandle::from_bytes(name, file.data)?;
        Ok(engine.index_image(&key, &image, &verifier)?)
    })
    .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            // Stored files and index entries stay one-to-one
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %remove_err, "Failed to remove stored upload");
            }
            return Err(e);
        }
    };

    let indexed_at = state
        .engine
        .record(&id)
        .map_or_else(Utc::now, |record| record.indexed_at);
    tracing::debug!(id = %id, filename = %filename, "Stored and indexed upload");
    Ok(IndexedImage {
        url: image_url(&id),
        id,
        filename,
        indexed_at,
        report,
    })
}
