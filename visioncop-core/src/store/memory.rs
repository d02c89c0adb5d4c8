use dashmap::DashMap;

use super::{rank, validate, Neighbor, VectorEntry, VectorStore};
use crate::error::Result;

/// Thread-safe in-process vector table.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    entries: DashMap<String, VectorEntry>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: impl IntoIterator<Item = VectorEntry>) -> Self {
        let store = Self::new();
        for entry in entries {
            store.entries.insert(entry.id.clone(), entry);
        }
        store
    }

    /// Insert and return the entry it replaced, if any.
    pub(crate) fn insert(&self, entry: VectorEntry) -> Option<VectorEntry> {
        self.entries.insert(entry.id.clone(), entry)
    }

    pub(crate) fn take(&self, id: &str) -> Option<VectorEntry> {
        self.entries.remove(id).map(|(_, entry)| entry)
    }

    /// All entries sorted by id.
    pub(crate) fn snapshot(&self) -> Vec<VectorEntry> {
        let mut entries: Vec<VectorEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

impl VectorStore for MemoryVectorStore {
    fn put_entry(&self, entry: VectorEntry) -> Result<()> {
        validate(&entry.id, &entry.vector)?;
        self.insert(entry);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<VectorEntry> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.take(id).is_some())
    }

    fn top_k(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let guards: Vec<_> = self.entries.iter().collect();
        rank(
            guards.iter().map(|e| (e.key().as_str(), e.value().vector.as_slice())),
            query,
            k,
        )
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}
