//! Vector storage for similarity search.
//!
//! A store maps image identifiers to unit-length embeddings and answers
//! top-K queries by linear scan. Vectors are assumed pre-normalized, so the
//! dot product is the cosine similarity.

mod file;
mod memory;

pub use file::FileVectorStore;
pub use memory::MemoryVectorStore;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::ImageReport;
use crate::embedding::cosine_similarity;
use crate::error::{Result, VisionError};

/// One stored embedding, with the forensic report taken at index time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
    /// Absent for entries written without analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ImageReport>,
}

impl VectorEntry {
    /// A bare entry stamped with the current time.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            indexed_at: Utc::now(),
            report: None,
        }
    }

    pub fn with_report(mut self, report: ImageReport) -> Self {
        self.report = Some(report);
        self
    }
}

/// A ranked match from [`VectorStore::top_k`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub score: f32,
}

/// Key-value table of embeddings with a ranked lookup.
///
/// Writing an existing id replaces the previous entry. A write is visible to
/// every subsequent read through the same store.
pub trait VectorStore: Send + Sync {
    /// Store a prepared entry after validating its id and vector.
    fn put_entry(&self, entry: VectorEntry) -> Result<()>;

    fn put(&self, id: &str, vector: Vec<f32>) -> Result<()> {
        self.put_entry(VectorEntry::new(id, vector))
    }

    fn get(&self, id: &str) -> Option<VectorEntry>;

    /// Returns whether the id was present.
    fn remove(&self, id: &str) -> Result<bool>;

    /// Up to `k` entries by descending dot product with `query`, ties broken
    /// by ascending id. Entries whose dimension differs from the query are
    /// skipped.
    fn top_k(&self, query: &[f32], k: usize) -> Vec<Neighbor>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All ids, sorted.
    fn ids(&self) -> Vec<String>;
}

pub(crate) fn validate(id: &str, vector: &[f32]) -> Result<()> {
    if id.trim().is_empty() {
        return Err(VisionError::InvalidInput("Vector id must not be empty".into()));
    }
    if vector.is_empty() {
        return Err(VisionError::InvalidInput(format!(
            "Vector for '{}' is empty",
            id
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(VisionError::InvalidInput(format!(
            "Vector for '{}' contains non-finite values",
            id
        )));
    }
    Ok(())
}

/// Score and rank `entries` against `query`.
pub(crate) fn rank<'a>(
    entries: impl Iterator<Item = (&'a str, &'a [f32])>,
    query: &[f32],
    k: usize,
) -> Vec<Neighbor> {
    if k == 0 || query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Neighbor> = entries
        .filter(|(_, vector)| vector.len() == query.len())
        .map(|(id, vector)| Neighbor {
            id: id.to_string(),
            score: cosine_similarity(query, vector),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<(String, Vec<f32>)> {
        vec![
            ("c".into(), vec![0.6, 0.8]),
            ("a".into(), vec![1.0, 0.0]),
            ("b".into(), vec![1.0, 0.0]),
            ("wide".into(), vec![1.0, 0.0, 0.0]),
            ("d".into(), vec![0.0, 1.0]),
        ]
    }

    fn ranked(k: usize) -> Vec<Neighbor> {
        let data = entries();
        rank(
            data.iter().map(|(id, v)| (id.as_str(), v.as_slice())),
            &[1.0, 0.0],
            k,
        )
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let ids: Vec<_> = ranked(10).into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_rank_truncates_and_handles_zero_k() {
        assert_eq!(ranked(2).len(), 2);
        assert!(ranked(0).is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(validate("", &[1.0]).is_err());
        assert!(validate("x", &[]).is_err());
        assert!(validate("x", &[f32::NAN]).is_err());
        assert!(validate("x", &[0.5]).is_ok());
    }

    #[test]
    fn test_entry_without_report_omits_field() {
        let json = serde_json::to_value(VectorEntry::new("a.png", vec![1.0])).unwrap();
        assert!(json.get("report").is_none());

        let back: VectorEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.report, None);
    }
}
