//! Similarity search over indexed images.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analysis::ImageReport;
use crate::embedding::Embedder;
use crate::error::{Result, VisionError};
use crate::media::ImageHandle;
use crate::store::{VectorEntry, VectorStore};
use crate::verify::Verifier;

/// Number of hits returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 5;

/// A search result: stored image id and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub similarity: f32,
}

/// What the index knows about one stored image, without its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub indexed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ImageReport>,
}

impl From<VectorEntry> for IndexRecord {
    fn from(entry: VectorEntry) -> Self {
        Self {
            id: entry.id,
            indexed_at: entry.indexed_at,
            report: entry.report,
        }
    }
}

/// Embeds images and looks them up in a vector store.
#[derive(Clone)]
pub struct SearchEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SearchEngine {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed `image_bytes` and store the vector under `id`, replacing any
    /// previous entry.
    #[instrument(skip_all, fields(id = %id, bytes = image_bytes.len()))]
    pub fn index(&self, id: &str, image_bytes: &[u8]) -> Result<()> {
        let vector = self.embed(id, image_bytes)?;
        self.store.put(id, vector)?;
        info!(total = self.store.len(), "Indexed image");
        Ok(())
    }

    /// Embed and analyze a decoded image, storing the vector together with
    /// its forensic report.
    #[instrument(skip_all, fields(id = %id, image = image.name()))]
    pub fn index_image(
        &self,
        id: &str,
        image: &ImageHandle,
        verifier: &Verifier,
    ) -> Result<ImageReport> {
        let vector = self.embed(id, image.bytes())?;
        let report = verifier.analyze(image)?;
        self.store
            .put_entry(VectorEntry::new(id, vector).with_report(report.clone()))?;
        info!(
            total = self.store.len(),
            manipulation = report.manipulation.score,
            "Indexed image"
        );
        Ok(report)
    }

    /// Top `k` stored images most similar to `image_bytes`.
    #[instrument(skip_all, fields(k, bytes = image_bytes.len()))]
    pub fn search(&self, image_bytes: &[u8], k: usize) -> Result<Vec<SearchHit>> {
        let vector = self.embed("query", image_bytes)?;
        let hits: Vec<SearchHit> = self
            .store
            .top_k(&vector, k)
            .into_iter()
            .map(|n| SearchHit {
                id: n.id,
                similarity: n.score,
            })
            .collect();
        debug!(hits = hits.len(), "Search complete");
        Ok(hits)
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        self.store.remove(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.store.ids()
    }

    pub fn record(&self, id: &str) -> Option<IndexRecord> {
        self.store.get(id).map(IndexRecord::from)
    }

    /// Every stored image, sorted by id.
    pub fn records(&self) -> Vec<IndexRecord> {
        self.ids().iter().filter_map(|id| self.record(id)).collect()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    fn embed(&self, name: &str, image_bytes: &[u8]) -> Result<Vec<f32>> {
        self.embedder.embed(image_bytes).ok_or_else(|| {
            VisionError::Embedding(format!("no embedding could be extracted from '{}'", name))
        })
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("model", &self.embedder.model_name())
            .field("entries", &self.store.len())
            .finish()
    }
}
