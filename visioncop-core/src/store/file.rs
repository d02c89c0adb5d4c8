use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{validate, MemoryVectorStore, Neighbor, VectorEntry, VectorStore};
use crate::error::{Result, VisionError};

/// Current on-disk index format version.
pub const INDEX_FORMAT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u8,
    entries: Vec<VectorEntry>,
}

/// Vector store persisted to a CBOR file after every write.
///
/// Reads are served from memory. Writers are serialized so the file always
/// reflects a consistent snapshot; a failed persist rolls the change back.
#[derive(Debug)]
pub struct FileVectorStore {
    path: PathBuf,
    memory: MemoryVectorStore,
    write_lock: Mutex<()>,
}

impl FileVectorStore {
    /// Open an index file, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let memory = if path.exists() {
            let bytes = fs::read(&path).map_err(|source| VisionError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let file: IndexFile = ciborium::from_reader(bytes.as_slice()).map_err(|e| {
                VisionError::Serialization(format!("{}: {}", path.display(), e))
            })?;
            if file.version != INDEX_FORMAT_VERSION {
                return Err(VisionError::Store(format!(
                    "Unsupported index version {} in {} (expected {})",
                    file.version,
                    path.display(),
                    INDEX_FORMAT_VERSION
                )));
            }
            info!(path = %path.display(), entries = file.entries.len(), "Loaded vector index");
            MemoryVectorStore::from_entries(file.entries)
        } else {
            debug!(path = %path.display(), "Index file absent, starting empty");
            MemoryVectorStore::new()
        };

        Ok(Self {
            path,
            memory,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            entries: self.memory.snapshot(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let tmp = self.path.with_extension("cbor.tmp");
        let handle = fs::File::create(&tmp).map_err(|source| self.io_error(source))?;
        let mut writer = BufWriter::new(handle);
        ciborium::into_writer(&file, &mut writer)
            .map_err(|e| VisionError::Serialization(e.to_string()))?;
        writer.flush().map_err(|source| self.io_error(source))?;
        drop(writer);
        fs::rename(&tmp, &self.path).map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), entries = file.entries.len(), "Persisted vector index");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> VisionError {
        VisionError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| VisionError::Store("Index write lock poisoned".into()))
    }

    fn restore(&self, id: &str, previous: Option<VectorEntry>) {
        match previous {
            Some(entry) => {
                self.memory.insert(entry);
            }
            None => {
                self.memory.take(id);
            }
        }
    }
}

impl VectorStore for FileVectorStore {
    fn put_entry(&self, entry: VectorEntry) -> Result<()> {
        validate(&entry.id, &entry.vector)?;
        let _guard = self.lock()?;

        let id = entry.id.clone();
        let previous = self.memory.insert(entry);
        if let Err(e) = self.persist() {
            self.restore(&id, previous);
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, id: &str) -> Option<VectorEntry> {
        self.memory.get(id)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.lock()?;
        let Some(previous) = self.memory.take(id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.memory.insert(previous);
            return Err(e);
        }
        Ok(true)
    }

    fn top_k(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        self.memory.top_k(query, k)
    }

    fn len(&self) -> usize {
        self.memory.len()
    }

    fn ids(&self) -> Vec<String> {
        self.memory.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ImageReport;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileVectorStore::open(dir.path().join("index.cbor")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.cbor");

        let store = FileVectorStore::open(&path).unwrap();
        store.put("a.png", vec![1.0, 0.0]).unwrap();
        store.put("b.png", vec![0.0, 1.0]).unwrap();
        store.remove("b.png").unwrap();
        drop(store);

        let reopened = FileVectorStore::open(&path).unwrap();
        assert_eq!(reopened.ids(), vec!["a.png"]);
        assert_eq!(reopened.get("a.png").unwrap().vector, vec![1.0, 0.0]);
    }

    #[test]
    fn test_report_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.cbor");
        let report = ImageReport {
            filename: "a.png".into(),
            sha3_256: "ab".repeat(32),
            perceptual_hash: "f0f0f0f0f0f0f0f0".into(),
            width: 8,
            height: 6,
            metadata: Default::default(),
            metadata_error: Some("Invalid TIFF byte order".into()),
            manipulation: Default::default(),
        };

        let store = FileVectorStore::open(&path).unwrap();
        store
            .put_entry(VectorEntry::new("a.png", vec![1.0]).with_report(report.clone()))
            .unwrap();
        store.put("bare.png", vec![0.5]).unwrap();
        drop(store);

        let reopened = FileVectorStore::open(&path).unwrap();
        assert_eq!(reopened.get("a.png").unwrap().report, Some(report));
        assert_eq!(reopened.get("bare.png").unwrap().report, None);
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.cbor");
        fs::write(&path, b"\xff\xff not cbor").unwrap();
        assert!(matches!(
            FileVectorStore::open(&path),
            Err(VisionError::Serialization(_))
        ));
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = TempDir::new().unwrap();
        // A directory where the index file should be makes rename fail.
        let path = dir.path().join("index.cbor");
        let store = FileVectorStore::open(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupant"), b"x").unwrap();

        assert!(store.put("a.png", vec![1.0]).is_err());
        assert!(store.get("a.png").is_none());
    }
}
