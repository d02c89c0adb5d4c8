//! VisionCop Core - image similarity search and authenticity verification
//!
//! This crate compares a query image against candidate images and decides
//! whether each candidate is an authentic copy, a reuse, a manipulation or a
//! different image altogether.
//!
//! # Signals
//!
//! - 64-bit DCT perceptual hash compared by Hamming distance
//! - EXIF capture metadata compared field by field against the original
//! - Pixel-statistics manipulation heuristics (brightness, block alignment,
//!   histogram concentration, error-level analysis)
//!
//! These are folded into a [`ConfidenceLabel`] and [`SeverityColor`] by the
//! [`verdict`] rules. Alongside verification, [`SearchEngine`] indexes images
//! as embedding vectors and returns the closest matches.
//!
//! # Example
//!
//! ```no_run
//! use visioncop_core::{ImageSource, Verifier};
//!
//! let verifier = Verifier::new();
//! let results = verifier.verify(
//!     &ImageSource::from_path("query.jpg"),
//!     &[
//!         ImageSource::from_path("original.jpg"),
//!         ImageSource::from_path("other.jpg"),
//!     ],
//! );
//! for result in &results {
//!     println!("{}: {}", result.filename, result.overall_confidence);
//! }
//! ```

pub mod analysis;
pub mod embedding;
pub mod error;
pub mod fingerprint;
pub mod manipulation;
pub mod media;
pub mod metadata;
pub mod search;
pub mod store;
pub mod verdict;
pub mod verify;

// Re-export main types for convenience
pub use analysis::{sha3_hex, ImageReport};
pub use embedding::{cosine_similarity, Embedder, EmbeddingModel, ModelConfig};
pub use error::{Result, VisionError};
pub use fingerprint::{fingerprint, hamming_distance, PerceptualHash, PerceptualHasher};
pub use manipulation::{score_manipulation, ManipulationEvidence, ManipulationScorer};
pub use media::{ImageHandle, ImageSource};
pub use metadata::{
    compare_metadata, ExifExtractor, MetadataComparison, MetadataExtractor, MetadataField,
    MetadataRecord,
};
pub use search::{IndexRecord, SearchEngine, SearchHit, DEFAULT_TOP_K};
pub use store::{FileVectorStore, MemoryVectorStore, Neighbor, VectorEntry, VectorStore};
pub use verdict::{synthesize, ConfidenceLabel, PixelStatus, SeverityColor};
pub use verify::{sort_results, VerificationResult, Verifier, VerifierConfig, FAILED_DISTANCE};
