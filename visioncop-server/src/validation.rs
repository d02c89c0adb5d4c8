//! Upload validation module
//!
//! Provides validation utilities for multipart image uploads and stored file names.

use crate::error::ApiError;

/// Allowed MIME type categories for image uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Default max file size in bytes (25 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// Leading bytes of each image container the engine decodes, with the extension
/// used when storing an upload.
const IMAGE_SIGNATURES: &[(&[u8], &str)] = &[
    (b"\xFF\xD8\xFF", "jpg"),
    (b"\x89PNG\r\n\x1a\n", "png"),
    (b"GIF87a", "gif"),
    (b"GIF89a", "gif"),
    (b"BM", "bmp"),
    (b"II*\x00", "tiff"),
    (b"MM\x00*", "tiff"),
];

/// Validates the Content-Type of an uploaded file
///
/// Accepts image/* and application/octet-stream. A missing Content-Type is
/// treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file is empty or exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// File extension for the image container `data` starts with, if recognised.
pub fn image_extension(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("webp");
    }
    IMAGE_SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, ext)| *ext)
}

/// Validates a file name taken from a request path before it is joined onto
/// the data directory.
pub fn validate_stored_name(name: &str) -> Result<&str, ApiError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.contains("..");
    if valid {
        Ok(name)
    } else {
        Err(ApiError::bad_request(format!("Invalid file name: '{}'", name)))
    }
}
