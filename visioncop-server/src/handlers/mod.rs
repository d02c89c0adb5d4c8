//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod analyze;
pub mod health;
pub mod images;
pub mod index;
pub mod search;
pub mod verify;

pub use crate::state::AppState;
pub use analyze::analyze_handler;
pub use health::{health, ready, status_handler, HealthResponse, ReadyResponse, StatusResponse};
pub use images::{
    delete_image_handler, image_handler, image_report_handler, list_images_handler,
    DeleteImageResponse, ImageListResponse, StoredImage,
};
pub use index::{index_handler, IndexResponse, IndexedImage};
pub use search::{search_handler, SearchHitResponse, SearchResponse};
pub use verify::{verify_handler, VerifyResponse};

use crate::error::ApiError;

/// Run CPU-bound engine work off the async runtime.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {}", e)))?
}

/// Public URL of a stored image.
pub(crate) fn image_url(id: &str) -> String {
    format!("/images/{}", id)
}
