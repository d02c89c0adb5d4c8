//! Similarity search handler
//!
//! Handles POST /search: nearest indexed images, optionally verified against the query.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use visioncop_core::{ImageSource, SearchHit, VerificationResult};

use super::{blocking, image_url};
use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// A search hit, with its verification when requested
#[derive(Serialize, ToSchema)]
pub struct SearchHitResponse {
    /// Index id of the stored image
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000.png")]
    pub id: String,
    /// Cosine similarity to the query, higher is closer
    #[schema(example = 0.97)]
    pub similarity: f32,
    #[schema(example = "/images/550e8400-e29b-41d4-a716-446655440000.png")]
    pub url: String,
    /// Present when `verify=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub verification: Option<VerificationResult>,
}

/// Response for a search
#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    /// Embedding model used for the lookup
    #[schema(example = "colour-layout-v1")]
    pub model: String,
    /// Hits, most similar first
    pub hits: Vec<SearchHitResponse>,
}

/// Find indexed images similar to a query
///
/// Accepts multipart/form-data with:
/// - **file** (required): The query image
/// - **top_k** (optional): Number of hits (default from server config)
/// - **verify** (optional): "true" to verify the query against every hit
#[utoipa::path(
    post,
    path = "/search",
    tag = "Search",
    request_body(content_type = "multipart/form-data", description = "Query image and options"),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "No file provided or invalid top_k"),
        (status = 422, description = "No embedding could be extracted from the query")
    )
)]
pub async fn search_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;
    let top_k = fields.get_count("top_k")?.unwrap_or(state.search_top_k);
    let verify = fields.get_bool("verify");
    let file = fields.take_file("file")?;
    let query_name = file.display_name("query");

    let engine = state.engine.clone();
    let verifier = state.verifier.clone();
    let data_dir = state.data_dir.clone();

    let hits: Vec<SearchHitResponse> = blocking(move || {
        let hits = engine.search(&file.data, top_k)?;
        if !verify {
            return Ok(hits.into_iter().map(|hit| hit_response(hit, None)).collect());
        }

        let query = ImageSource::from_bytes(query_name, file.data);
        let candidates: Vec<ImageSource> = hits
            .iter()
            .map(|hit| ImageSource::from_path(data_dir.join(&hit.id)))
            .collect();
        let results = verifier.verify_in_order(&query, &candidates);

        Ok(hits
            .into_iter()
            .zip(results)
            .map(|(hit, result)| hit_response(hit, Some(result)))
            .collect::<Vec<_>>())
    })
    .await?;

    tracing::debug!(hits = hits.len(), top_k, verify, "Search request served");

    Ok(Json(SearchResponse {
        model: state.engine.model_name().to_string(),
        hits,
    }))
}

fn hit_response(hit: SearchHit, verification: Option<VerificationResult>) -> SearchHitResponse {
    SearchHitResponse {
        url: image_url(&hit.id),
        id: hit.id,
        similarity: hit.similarity,
        verification,
    }
}
