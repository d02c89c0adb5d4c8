//! Authenticity verification handler
//!
//! Handles POST /verify requests comparing a query image against uploaded candidates.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use visioncop_core::{ImageSource, VerificationResult};

use super::blocking;
use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;

/// Response for verification
#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Query file name
    #[schema(example = "suspect.jpg")]
    pub query: String,
    /// One result per candidate, closest first; failed comparisons last
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<VerificationResult>,
}

/// Verify a query image against candidate originals
///
/// Accepts multipart/form-data with:
/// - **query** (required): The image under suspicion
/// - **candidates** (required, repeatable): Presumed originals
///
/// Every candidate gets a result. A candidate that cannot be decoded is
/// reported as `Verification Failed` with `pixel_distance = -1` rather than
/// failing the request.
#[utoipa::path(
    post,
    path = "/verify",
    tag = "Verification",
    request_body(
        content_type = "multipart/form-data",
        description = "Query image and one or more candidate images"
    ),
    responses(
        (status = 200, description = "Verification completed", body = VerifyResponse),
        (status = 400, description = "Missing query or candidates, unsupported upload"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerifyResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;

    let query = fields.take_file("query")?;
    let candidates = fields.take_files("candidates");
    if candidates.is_empty() {
        return Err(ApiError::bad_request(
            "No candidates provided. Use 'candidates' field in multipart form.",
        ));
    }

    let query_name = query.display_name("query");
    let query = ImageSource::from_bytes(query_name.clone(), query.data);
    let candidates: Vec<ImageSource> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| ImageSource::from_bytes(c.display_name(&format!("candidate-{}", i + 1)), c.data))
        .collect();

    tracing::info!(query = %query_name, candidates = candidates.len(), "Verify request");

    let verifier = state.verifier.clone();
    let results = blocking(move || Ok(verifier.verify(&query, &candidates))).await?;

    Ok(Json(VerifyResponse {
        query: query_name,
        results,
    }))
}
