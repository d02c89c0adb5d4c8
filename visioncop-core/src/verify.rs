//! Verification orchestrator.
//!
//! [`Verifier::verify`] compares one query against a batch of candidates and
//! always returns exactly one [`VerificationResult`] per candidate. Failures
//! never escape a single comparison: they are encoded in the result fields.
//!
//! Candidates are compared in parallel on a rayon pool. Results are sorted by
//! ascending pixel distance afterwards, failed comparisons last.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::analysis::{build_report, ImageReport};
use crate::error::{Result, VisionError};
use crate::fingerprint::{PerceptualHash, PerceptualHasher};
use crate::manipulation::{ManipulationEvidence, ManipulationScorer, ELA_JPEG_QUALITY};
use crate::media::{ImageHandle, ImageSource};
use crate::metadata::{compare_metadata, ExifExtractor, MetadataComparison, MetadataExtractor};
use crate::verdict::{synthesize, ConfidenceLabel, PixelStatus, SeverityColor};

/// Rendered value of `pixel_distance` when the comparison failed.
pub const FAILED_DISTANCE: i64 = -1;

/// Outcome of comparing the query against one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Candidate display name.
    pub filename: String,
    /// Hamming distance between perceptual hashes; `None` (rendered `-1`) on failure.
    #[serde(
        serialize_with = "serialize_distance",
        deserialize_with = "deserialize_distance"
    )]
    pub pixel_distance: Option<u32>,
    pub pixel_status: PixelStatus,
    pub metadata_match: bool,
    pub metadata_issues: Vec<String>,
    pub manipulation_score: f64,
    pub manipulation_flags: Vec<String>,
    pub overall_confidence: ConfidenceLabel,
    pub severity_color: SeverityColor,
    /// Why the comparison could not be carried out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl VerificationResult {
    fn new(
        filename: String,
        pixel_distance: Option<u32>,
        metadata: MetadataComparison,
        manipulation: &ManipulationEvidence,
    ) -> Self {
        let confidence = synthesize(pixel_distance, &metadata, manipulation);
        Self {
            filename,
            pixel_distance,
            pixel_status: PixelStatus::from_distance(pixel_distance),
            metadata_match: metadata.matches,
            metadata_issues: metadata.issues,
            manipulation_score: manipulation.score,
            manipulation_flags: manipulation.flags.clone(),
            overall_confidence: confidence,
            severity_color: confidence.severity(),
            failure: None,
        }
    }

    /// A result for a comparison that could not be carried out.
    pub fn failed(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            pixel_distance: None,
            pixel_status: PixelStatus::VerificationFailed,
            metadata_match: false,
            metadata_issues: Vec::new(),
            manipulation_score: 0.0,
            manipulation_flags: Vec::new(),
            overall_confidence: ConfidenceLabel::VerificationFailed,
            severity_color: SeverityColor::Gray,
            failure: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.pixel_distance.is_none()
    }

    /// Distance as rendered to callers (`-1` when failed).
    pub fn rendered_distance(&self) -> i64 {
        self.pixel_distance.map_or(FAILED_DISTANCE, i64::from)
    }
}

fn serialize_distance<S: Serializer>(
    distance: &Option<u32>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(distance.map_or(FAILED_DISTANCE, i64::from))
}

fn deserialize_distance<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw).ok())
}

/// Sort order: ascending distance, failed comparisons last. Stable.
pub fn sort_results(results: &mut [VerificationResult]) {
    results.sort_by_key(|r| (r.pixel_distance.is_none(), r.pixel_distance));
}

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Worker threads for candidate fan-out; 0 uses the global rayon pool.
    pub workers: usize,
    /// JPEG quality for error-level analysis.
    pub ela_quality: u8,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            ela_quality: ELA_JPEG_QUALITY,
        }
    }
}

/// Query-side signals computed once per batch.
struct PreparedQuery {
    image: ImageHandle,
    hash: PerceptualHash,
    evidence: ManipulationEvidence,
}

/// The verification engine entry point.
pub struct Verifier {
    hasher: PerceptualHasher,
    extractor: Arc<dyn MetadataExtractor>,
    scorer: ManipulationScorer,
    pool: Option<rayon::ThreadPool>,
}

impl Verifier {
    /// Default configuration with the EXIF extractor.
    pub fn new() -> Self {
        Self {
            hasher: PerceptualHasher::new(),
            extractor: Arc::new(ExifExtractor),
            scorer: ManipulationScorer::new(),
            pool: None,
        }
    }

    pub fn with_config(config: VerifierConfig) -> Result<Self> {
        let pool = if config.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("visioncop-verify-{}", i))
                .build()
                .map_err(|e| VisionError::InvalidInput(format!("Worker pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            hasher: PerceptualHasher::new(),
            extractor: Arc::new(ExifExtractor),
            scorer: ManipulationScorer::new().with_ela_quality(config.ela_quality),
            pool,
        })
    }

    /// Replace the metadata extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Compare `query` against every candidate, closest first. Never fails.
    #[instrument(skip_all, fields(query = %query.name(), candidates = candidates.len()))]
    pub fn verify(&self, query: &ImageSource, candidates: &[ImageSource]) -> Vec<VerificationResult> {
        let mut results = self.verify_in_order(query, candidates);
        sort_results(&mut results);

        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(results = results.len(), failed, "Verification batch complete");
        results
    }

    /// Like [`Verifier::verify`] but results stay in candidate order, so
    /// `results[i]` belongs to `candidates[i]`.
    pub fn verify_in_order(
        &self,
        query: &ImageSource,
        candidates: &[ImageSource],
    ) -> Vec<VerificationResult> {
        let prepared = query.load().and_then(|image| self.prepare(image));
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "Query image unusable, failing every candidate");
                let reason = format!("Query image: {}", e);
                return candidates
                    .iter()
                    .map(|c| VerificationResult::failed(c.name(), reason.clone()))
                    .collect();
            }
        };

        let compare_one = |candidate: &ImageSource| match candidate.load() {
            Ok(image) => self.compare_prepared(&prepared, &image),
            Err(e) => {
                debug!(candidate = %candidate.name(), error = %e, "Candidate failed to load");
                VerificationResult::failed(candidate.name(), e.to_string())
            }
        };

        match &self.pool {
            Some(pool) => pool.install(|| candidates.par_iter().map(compare_one).collect()),
            None => candidates.par_iter().map(compare_one).collect(),
        }
    }

    /// Compare two already-loaded images.
    pub fn compare(&self, query: &ImageHandle, candidate: &ImageHandle) -> VerificationResult {
        match self.prepare(query.clone()) {
            Ok(prepared) => self.compare_prepared(&prepared, candidate),
            Err(e) => VerificationResult::failed(candidate.name(), format!("Query image: {}", e)),
        }
    }

    /// Fingerprint, metadata and manipulation report for one image.
    pub fn analyze(&self, image: &ImageHandle) -> Result<ImageReport> {
        build_report(image, &self.hasher, self.extractor.as_ref(), &self.scorer)
    }

    fn prepare(&self, image: ImageHandle) -> Result<PreparedQuery> {
        let hash = self.hasher.hash_handle(&image)?;
        let evidence = self.scorer.score(&image);
        Ok(PreparedQuery {
            image,
            hash,
            evidence,
        })
    }

    fn compare_prepared(&self, query: &PreparedQuery, candidate: &ImageHandle) -> VerificationResult {
        let candidate_hash = match self.hasher.hash_handle(candidate) {
            Ok(hash) => hash,
            Err(e) => return VerificationResult::failed(candidate.name(), e.to_string()),
        };
        let distance = query.hash.distance(&candidate_hash);
        let metadata = compare_metadata(self.extractor.as_ref(), &query.image, candidate);

        let result = VerificationResult::new(
            candidate.name().to_string(),
            Some(distance),
            metadata,
            &query.evidence,
        );
        debug!(
            candidate = candidate.name(),
            distance,
            confidence = %result.overall_confidence,
            "Compared candidate"
        );
        result
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("scorer", &self.scorer)
            .field(
                "workers",
                &self.pool.as_ref().map(|p| p.current_num_threads()),
            )
            .finish()
    }
}
