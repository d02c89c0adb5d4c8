//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use tracing::debug;
use visioncop_core::{EmbeddingModel, FileVectorStore, SearchEngine, SeverityColor};
use walkdir::WalkDir;

/// File extensions the decoder understands.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff",
];

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    /// Human-readable output is wanted.
    pub fn human(&self) -> bool {
        !self.json && !self.quiet
    }
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand files and directories into a sorted, de-duplicated list of image files.
///
/// Directories are scanned one level deep unless `recursive` is set. Files
/// given explicitly are kept regardless of extension.
pub fn collect_images(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_dir() {
            let depth = if recursive { usize::MAX } else { 1 };
            let found = WalkDir::new(path)
                .max_depth(depth)
                .into_iter()
                .filter_map(|entry| {
                    entry.ok().and_then(|entry| {
                        let path = entry.path();
                        (path.is_file() && is_supported_image(path)).then(|| path.to_path_buf())
                    })
                })
                .collect::<Vec<_>>();
            debug!(dir = %path.display(), found = found.len(), "Scanned directory");
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Open the search engine over the index file at `path`.
pub fn open_engine(path: &Path) -> Result<SearchEngine> {
    let store = FileVectorStore::open(path)
        .with_context(|| format!("Failed to open index file {}", path.display()))?;
    Ok(SearchEngine::new(
        Arc::new(EmbeddingModel::new()),
        Arc::new(store),
    ))
}

/// Identifier under which a file is indexed: its absolute path.
pub fn index_id(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Colour text by severity.
pub fn paint(severity: SeverityColor, text: &str) -> ColoredString {
    match severity {
        SeverityColor::Green => text.green(),
        SeverityColor::Orange => text.yellow(),
        SeverityColor::Red => text.red(),
        SeverityColor::Gray => text.dimmed(),
    }
}
