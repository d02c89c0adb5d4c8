//! Capture-metadata extraction and comparison.
//!
//! The comparison is asymmetric: the original (candidate) image is the
//! reference, and only fields present in it are checked against the query.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VisionError};
use crate::media::ImageHandle;

/// Value substituted for a field the query image lacks.
pub const MISSING: &str = "Missing";

/// Semantic metadata fields, in comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    CaptureTimestamp,
    Width,
    Height,
    CameraMake,
    CameraModel,
    Software,
}

impl MetadataField {
    pub const ALL: [MetadataField; 6] = [
        MetadataField::CaptureTimestamp,
        MetadataField::Width,
        MetadataField::Height,
        MetadataField::CameraMake,
        MetadataField::CameraModel,
        MetadataField::Software,
    ];

    /// Human-readable label used in issue strings.
    pub fn label(self) -> &'static str {
        match self {
            Self::CaptureTimestamp => "Capture time",
            Self::Width => "Image width",
            Self::Height => "Image height",
            Self::CameraMake => "Camera make",
            Self::CameraModel => "Camera model",
            Self::Software => "Software",
        }
    }

    /// EXIF tags consulted for this field, most specific first.
    fn exif_tags(self) -> &'static [exif::Tag] {
        match self {
            Self::CaptureTimestamp => &[exif::Tag::DateTimeOriginal, exif::Tag::DateTime],
            Self::Width => &[exif::Tag::PixelXDimension, exif::Tag::ImageWidth],
            Self::Height => &[exif::Tag::PixelYDimension, exif::Tag::ImageLength],
            Self::CameraMake => &[exif::Tag::Make],
            Self::CameraModel => &[exif::Tag::Model],
            Self::Software => &[exif::Tag::Software],
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Extracted metadata. Absent fields are simply not present in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord {
    fields: BTreeMap<MetadataField, String>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: MetadataField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn with(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Field value, or [`MISSING`] when absent.
    pub fn value_or_missing(&self, field: MetadataField) -> &str {
        self.get(field).unwrap_or(MISSING)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataField, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Source of embedded capture metadata.
///
/// A read failure must be returned as an error, never as an empty record.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, image_bytes: &[u8]) -> Result<MetadataRecord>;
}

/// EXIF-backed extractor.
///
/// Formats that cannot carry EXIF, and files without an EXIF block, produce an
/// empty record. A corrupt EXIF block is a [`VisionError::Metadata`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl MetadataExtractor for ExifExtractor {
    fn extract(&self, image_bytes: &[u8]) -> Result<MetadataRecord> {
        if !can_carry_exif(image_bytes) {
            return Ok(MetadataRecord::default());
        }

        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(image_bytes)) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(MetadataRecord::default()),
            Err(e) => return Err(VisionError::Metadata(e.to_string())),
        };

        let mut record = MetadataRecord::default();
        for field in MetadataField::ALL {
            let value = field
                .exif_tags()
                .iter()
                .filter_map(|tag| exif.get_field(*tag, exif::In::PRIMARY))
                .find_map(exif_value);
            if let Some(value) = value {
                record.insert(field, value);
            }
        }

        debug!(fields = record.len(), "Extracted EXIF metadata");
        Ok(record)
    }
}

fn can_carry_exif(data: &[u8]) -> bool {
    matches!(
        image::guess_format(data),
        Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff | ImageFormat::WebP)
    )
}

fn exif_value(field: &exif::Field) -> Option<String> {
    match &field.value {
        exif::Value::Ascii(parts) => parts
            .iter()
            .map(|p| {
                String::from_utf8_lossy(p)
                    .trim_matches(char::from(0))
                    .trim()
                    .to_string()
            })
            .find(|s| !s.is_empty()),
        value => value
            .get_uint(0)
            .map(|v| v.to_string())
            .or_else(|| Some(field.display_value().to_string())),
    }
}

/// Outcome of comparing query metadata against an original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataComparison {
    /// True iff `issues` is empty.
    pub matches: bool,
    pub issues: Vec<String>,
}

impl MetadataComparison {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            matches: issues.is_empty(),
            issues,
        }
    }

    /// A comparison that could not be carried out.
    pub fn read_error(err: &VisionError) -> Self {
        let issue = match err {
            VisionError::Metadata(_) => err.to_string(),
            other => format!("Metadata read error: {}", other),
        };
        Self::from_issues(vec![issue])
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl Default for MetadataComparison {
    fn default() -> Self {
        Self::from_issues(Vec::new())
    }
}

/// Compare two already-extracted records, `original` being the reference.
pub fn compare_records(query: &MetadataRecord, original: &MetadataRecord) -> MetadataComparison {
    let issues = MetadataField::ALL
        .iter()
        .filter_map(|&field| {
            let expected = original.get(field)?;
            let actual = query.value_or_missing(field);
            (expected != actual)
                .then(|| format!("{}: {} → {}", field.label(), expected, actual))
        })
        .collect();
    MetadataComparison::from_issues(issues)
}

/// Extract and compare metadata of `query` against `original`.
///
/// Never fails: an extraction error becomes a single issue string.
pub fn compare_metadata(
    extractor: &dyn MetadataExtractor,
    query: &ImageHandle,
    original: &ImageHandle,
) -> MetadataComparison {
    let extracted = extractor
        .extract(original.bytes())
        .and_then(|orig| extractor.extract(query.bytes()).map(|q| (q, orig)));

    match extracted {
        Ok((query_meta, original_meta)) => compare_records(&query_meta, &original_meta),
        Err(e) => {
            debug!(error = %e, query = query.name(), original = original.name(), "Metadata read failed");
            MetadataComparison::read_error(&e)
        }
    }
}
