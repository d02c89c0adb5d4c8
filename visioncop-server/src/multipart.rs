//! Multipart form parsing helpers
//!
//! Provides reusable abstractions for parsing multipart/form-data uploads,
//! reducing code duplication across handlers.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

impl FileField {
    /// Display name: the client filename, or `fallback` when none was sent
    pub fn display_name(&self, fallback: &str) -> String {
        match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Parsed multipart form fields
///
/// A part carrying a filename is a file; every other part is a text field.
/// Several files may share one field name (e.g. repeated `candidates`).
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File fields indexed by name, in upload order
    files: HashMap<String, Vec<FileField>>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request, validating every file's
    /// Content-Type and size.
    pub async fn parse(multipart: &mut Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if let Some(file_name) = field.file_name().map(|s| s.to_string()) {
                let content_type = field.content_type().map(|s| s.to_string());
                validate_content_type(content_type.as_deref())?;

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::bad_request(format!("Failed to read file '{}': {}", file_name, e))
                    })?
                    .to_vec();

                validate_file_size(data.len(), max_file_size)?;

                fields.files.entry(name).or_default().push(FileField {
                    data,
                    content_type,
                    file_name: Some(file_name),
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.text_fields.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Take the single file uploaded under `name`
    ///
    /// Returns an error if no file was uploaded under that name.
    pub fn take_file(&mut self, name: &str) -> Result<FileField, ApiError> {
        let mut files = self.take_files(name);
        if files.is_empty() {
            return Err(ApiError::bad_request(format!(
                "No file provided. Use '{}' field in multipart form.",
                name
            )));
        }
        Ok(files.swap_remove(0))
    }

    /// Take every file uploaded under `name`, in upload order
    pub fn take_files(&mut self, name: &str) -> Vec<FileField> {
        self.files.remove(name).unwrap_or_default()
    }

    /// Get a text field value
    ///
    /// Returns `None` if the field is not present.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    /// Get a text field parsed as a boolean
    ///
    /// Returns `true` if the field value is "true" (case-insensitive), `false` otherwise.
    pub fn get_bool(&self, name: &str) -> bool {
        self.text_fields
            .get(name)
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Get a text field parsed as a positive count
    ///
    /// Returns `Ok(None)` when the field is missing or empty.
    pub fn get_count(&self, name: &str) -> Result<Option<usize>, ApiError> {
        match self.text_fields.get(name).map(|s| s.trim()) {
            Some(value) if !value.is_empty() => value
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("'{}' must be a non-negative integer", name))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_text(pairs: &[(&str, &str)]) -> MultipartFields {
        MultipartFields {
            files: HashMap::new(),
            text_fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn file(name: &str) -> FileField {
        FileField {
            data: vec![1, 2, 3],
            content_type: None,
            file_name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_get_bool() {
        let fields = with_text(&[
            ("flag1", "true"),
            ("flag2", "false"),
            ("flag3", "TRUE"),
            ("flag4", "yes"),
        ]);

        assert!(fields.get_bool("flag1"));
        assert!(!fields.get_bool("flag2"));
        assert!(fields.get_bool("flag3"));
        assert!(!fields.get_bool("flag4"));
        assert!(!fields.get_bool("missing"));
    }

    #[test]
    fn test_get_count() {
        let fields = with_text(&[("top_k", "3"), ("blank", ""), ("bad", "-1")]);
        assert_eq!(fields.get_count("top_k").unwrap(), Some(3));
        assert_eq!(fields.get_count("blank").unwrap(), None);
        assert_eq!(fields.get_count("missing").unwrap(), None);
        assert!(fields.get_count("bad").is_err());
    }

    #[test]
    fn test_take_file_missing() {
        let mut fields = MultipartFields::default();
        assert!(fields.take_file("query").is_err());
        assert!(fields.take_files("candidates").is_empty());
    }

    #[test]
    fn test_take_files_keeps_upload_order() {
        let mut fields = MultipartFields::default();
        fields
            .files
            .insert("candidates".into(), vec![file("a.png"), file("b.png")]);
        let names: Vec<_> = fields
            .take_files("candidates")
            .iter()
            .map(|f| f.display_name("?"))
            .collect();
        assert_eq!(names, ["a.png", "b.png"]);
    }

    #[test]
    fn test_display_name_fallback() {
        let field = FileField {
            data: vec![],
            content_type: None,
            file_name: Some(String::new()),
        };
        assert_eq!(field.display_name("query"), "query");
    }
}
