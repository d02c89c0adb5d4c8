//! Single-image fingerprint report.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::Result;
use crate::fingerprint::PerceptualHasher;
use crate::manipulation::{ManipulationEvidence, ManipulationScorer};
use crate::media::ImageHandle;
use crate::metadata::{MetadataExtractor, MetadataRecord};

/// Everything the engine can say about one image on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub filename: String,
    /// SHA3-256 of the encoded file bytes, hex.
    pub sha3_256: String,
    /// 64-bit perceptual hash, hex.
    pub perceptual_hash: String,
    pub width: u32,
    pub height: u32,
    pub metadata: MetadataRecord,
    /// Set when the metadata block could not be read; `metadata` is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
    pub manipulation: ManipulationEvidence,
}

/// SHA3-256 digest of raw bytes as lowercase hex.
pub fn sha3_hex(data: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub(crate) fn build_report(
    image: &ImageHandle,
    hasher: &PerceptualHasher,
    extractor: &dyn MetadataExtractor,
    scorer: &ManipulationScorer,
) -> Result<ImageReport> {
    let perceptual_hash = hasher.hash_handle(image)?;
    let (metadata, metadata_error) = match extractor.extract(image.bytes()) {
        Ok(record) => (record, None),
        Err(e) => (MetadataRecord::default(), Some(e.to_string())),
    };

    Ok(ImageReport {
        filename: image.name().to_string(),
        sha3_256: sha3_hex(image.bytes()),
        perceptual_hash: perceptual_hash.to_hex(),
        width: image.width(),
        height: image.height(),
        metadata,
        metadata_error,
        manipulation: scorer.score(image),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use crate::metadata::ExifExtractor;
    use image::{DynamicImage, Rgb, RgbImage};

    struct BrokenExif;

    impl MetadataExtractor for BrokenExif {
        fn extract(&self, _image_bytes: &[u8]) -> Result<MetadataRecord> {
            Err(VisionError::Metadata("bad IFD offset".into()))
        }
    }

    fn handle() -> ImageHandle {
        let img = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]));
        ImageHandle::from_image("report.png", DynamicImage::ImageRgb8(img)).unwrap()
    }

    #[test]
    fn test_sha3_hex_known_vector() {
        assert_eq!(
            sha3_hex(b""),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_report_fields() {
        let image = handle();
        let report =
            build_report(&image, &PerceptualHasher::new(), &ExifExtractor, &ManipulationScorer::new())
                .unwrap();
        assert_eq!(report.filename, "report.png");
        assert_eq!((report.width, report.height), (40, 30));
        assert_eq!(report.sha3_256.len(), 64);
        assert_eq!(report.perceptual_hash.len(), 16);
        assert!(report.metadata.is_empty());
        assert!(report.metadata_error.is_none());
    }

    #[test]
    fn test_report_keeps_metadata_error() {
        let report =
            build_report(&handle(), &PerceptualHasher::new(), &BrokenExif, &ManipulationScorer::new())
                .unwrap();
        assert_eq!(
            report.metadata_error.as_deref(),
            Some("Metadata read error: bad IFD offset")
        );
    }
}
