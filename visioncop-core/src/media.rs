//! Loaded image handles.
//!
//! An [`ImageHandle`] keeps both the raw encoded bytes (needed for metadata
//! extraction) and the decoded pixels (needed for hashing and forensics).
//! Handles are immutable once loaded and cheap to clone.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{Result, VisionError};

/// Where an image comes from before it is decoded.
#[derive(Clone)]
pub enum ImageSource {
    /// A file on disk.
    Path(PathBuf),
    /// Bytes already in memory (uploads), with a display name.
    Bytes { name: String, data: Vec<u8> },
    /// An image the caller has already decoded.
    Loaded(ImageHandle),
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes {
            name: name.into(),
            data,
        }
    }

    pub fn from_handle(handle: ImageHandle) -> Self {
        Self::Loaded(handle)
    }

    /// Display name used in results: the file name for paths.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => display_name(path),
            Self::Bytes { name, .. } => name.clone(),
            Self::Loaded(handle) => handle.name().to_string(),
        }
    }

    /// Read and decode the image. A loaded source is not decoded again.
    pub fn load(&self) -> Result<ImageHandle> {
        match self {
            Self::Path(path) => ImageHandle::open(path),
            Self::Bytes { name, data } => ImageHandle::from_bytes(name.clone(), data.clone()),
            Self::Loaded(handle) => Ok(handle.clone()),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes { name, data } => f
                .debug_struct("Bytes")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
            Self::Loaded(handle) => f.debug_tuple("Loaded").field(handle).finish(),
        }
    }
}

/// Decoded image plus the bytes it was decoded from.
#[derive(Clone)]
pub struct ImageHandle {
    name: String,
    bytes: Arc<[u8]>,
    pixels: Arc<DynamicImage>,
}

impl ImageHandle {
    /// Read a file and decode it.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| VisionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(display_name(path), bytes)
    }

    /// Decode an in-memory encoded image.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let pixels = image::load_from_memory(&bytes).map_err(|e| VisionError::decode(&name, e))?;
        Ok(Self {
            name,
            bytes: bytes.into(),
            pixels: Arc::new(pixels),
        })
    }

    /// Wrap already-decoded pixels, encoding them as PNG to obtain the byte form.
    pub fn from_image(name: impl Into<String>, pixels: DynamicImage) -> Result<Self> {
        let name = name.into();
        let mut buffer = Cursor::new(Vec::new());
        pixels
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| VisionError::decode(&name, e))?;
        Ok(Self {
            name,
            bytes: buffer.into_inner().into(),
            pixels: Arc::new(pixels),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("dimensions", &self.pixels.dimensions())
            .finish()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
