//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document for the VisionCop API, served at `/docs`.

use utoipa::OpenApi;

use crate::handlers::{
    DeleteImageResponse, HealthResponse, ImageListResponse, IndexResponse, IndexedImage,
    ReadyResponse, SearchHitResponse, SearchResponse, StatusResponse, StoredImage, VerifyResponse,
};

/// VisionCop API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VisionCop API",
        version = "0.1.0",
        description = r#"
## Image Similarity Search and Authenticity Verification

VisionCop finds images similar to a query and judges whether each match is an
authentic copy, a reuse, a manipulation or a different image.

- **Perceptual hashing** - 64-bit DCT hash compared by Hamming distance
- **Metadata comparison** - EXIF capture fields checked against the original
- **Manipulation heuristics** - brightness statistics, JPEG block alignment,
  histogram concentration and error-level analysis

### How It Works

1. **Index** reference images via `POST /index`
2. **Search** for the closest matches via `POST /search` (add `verify=true`
   to verify each hit)
3. **Verify** a query against explicit candidates via `POST /verify`
4. **Analyze** a single image via `POST /analyze`
5. **Manage** the index via `GET /images`, `GET /images/{id}/report` and
   `DELETE /images/{id}`

Each verification result carries an `overall_confidence` label and a
`severity_color` (green, yellow, orange, red, gray).
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Search", description = "Index images and find similar ones"),
        (name = "Verification", description = "Authenticity verdicts and single-image reports"),
        (name = "Images", description = "Stored image listing, retrieval and removal"),
        (name = "Health", description = "Service health, readiness and index status")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::health::status_handler,
        crate::handlers::index::index_handler,
        crate::handlers::search::search_handler,
        crate::handlers::verify::verify_handler,
        crate::handlers::analyze::analyze_handler,
        crate::handlers::images::list_images_handler,
        crate::handlers::images::image_handler,
        crate::handlers::images::image_report_handler,
        crate::handlers::images::delete_image_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            StatusResponse,
            IndexResponse,
            IndexedImage,
            SearchResponse,
            SearchHitResponse,
            VerifyResponse,
            StoredImage,
            ImageListResponse,
            DeleteImageResponse,
        )
    )
)]
pub struct ApiDoc;
