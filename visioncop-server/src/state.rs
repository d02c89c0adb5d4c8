//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use visioncop_core::{
    EmbeddingModel, FileVectorStore, MemoryVectorStore, SearchEngine, Verifier, VectorStore,
};

use crate::config::Config;
use crate::error::ApiError;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Embedding model plus vector index
    pub engine: SearchEngine,
    /// Verification orchestrator
    pub verifier: Arc<Verifier>,
    /// Directory holding indexed uploads, served by /images
    pub data_dir: PathBuf,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
    /// Default hit count for /search
    pub search_top_k: usize,
}

impl AppState {
    /// Build state from config, opening the index file when one is configured.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let Some(path) = &config.index_path else {
            tracing::warn!("Vector index: in-memory only");
            return Ok(Self::in_memory(config));
        };

        let store = FileVectorStore::open(path)?;
        tracing::info!(
            index = %path.display(),
            entries = store.len(),
            "Opened vector index"
        );
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// State backed by an in-memory index, whatever `config.index_path` says.
    pub fn in_memory(config: &Config) -> Self {
        Self::with_store(Arc::new(MemoryVectorStore::new()), config)
    }

    fn with_store(store: Arc<dyn VectorStore>, config: &Config) -> Self {
        let model = EmbeddingModel::new();
        model.warm_up();
        let engine = SearchEngine::new(Arc::new(model), store);
        Self::new(engine, Arc::new(Verifier::new()), config)
    }

    /// Assemble state from already-built engine parts.
    pub fn new(engine: SearchEngine, verifier: Arc<Verifier>, config: &Config) -> Self {
        Self {
            engine,
            verifier,
            data_dir: config.data_dir.clone(),
            max_file_size: config.max_file_size(),
            search_top_k: config.search_top_k,
        }
    }
}
