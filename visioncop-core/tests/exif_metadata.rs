//! EXIF extraction and comparison on JPEGs carrying a real APP1 segment.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use visioncop_core::{
    compare_metadata, ConfidenceLabel, ExifExtractor, ImageHandle, ImageSource,
    MetadataExtractor, MetadataField, MetadataRecord, Verifier, VisionError,
};

const MAKE: u16 = 0x010F;
const MODEL: u16 = 0x0110;
const SOFTWARE: u16 = 0x0131;
const DATE_TIME: u16 = 0x0132;
const ASCII: u16 = 2;

/// Offset of IFD0 from the start of the TIFF header.
const IFD0_OFFSET: u32 = 8;

fn gradient_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// Little-endian TIFF block with one IFD of ASCII entries. Tags must be
/// given in ascending order.
fn tiff_ifd0(entries: &[(u16, &str)]) -> Vec<u8> {
    let mut tiff = b"II\x2a\x00".to_vec();
    tiff.extend_from_slice(&IFD0_OFFSET.to_le_bytes());

    let data_start = IFD0_OFFSET as usize + 2 + entries.len() * 12 + 4;
    let mut data = Vec::new();

    tiff.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, value) in entries {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);

        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&ASCII.to_le_bytes());
        tiff.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        if bytes.len() <= 4 {
            bytes.resize(4, 0);
            tiff.extend_from_slice(&bytes);
        } else {
            let offset = (data_start + data.len()) as u32;
            tiff.extend_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(&bytes);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&data);
    tiff
}

/// Insert an APP1 `Exif` segment right after the JPEG SOI marker.
fn with_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn camera_jpeg(model: &str) -> Vec<u8> {
    with_exif(
        &gradient_jpeg(),
        &tiff_ifd0(&[
            (MAKE, "Canon"),
            (MODEL, model),
            (SOFTWARE, "FW1.0"),
            (DATE_TIME, "2024:01:15 12:30:45"),
        ]),
    )
}

/// IFD0 claims four entries but the segment ends after the first.
fn truncated_jpeg() -> Vec<u8> {
    let mut tiff = tiff_ifd0(&[(MAKE, "Canon")]);
    tiff.truncate(IFD0_OFFSET as usize);
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&MAKE.to_le_bytes());
    tiff.extend_from_slice(&ASCII.to_le_bytes());
    tiff.extend_from_slice(&6u32.to_le_bytes());
    tiff.extend_from_slice(&64u32.to_le_bytes());
    with_exif(&gradient_jpeg(), &tiff)
}

#[test]
fn test_extracts_camera_record_from_jpeg() {
    let record = ExifExtractor.extract(&camera_jpeg("EOS R5")).unwrap();

    let expected = MetadataRecord::new()
        .with(MetadataField::CaptureTimestamp, "2024:01:15 12:30:45")
        .with(MetadataField::CameraMake, "Canon")
        .with(MetadataField::CameraModel, "EOS R5")
        .with(MetadataField::Software, "FW1.0");
    assert_eq!(record, expected);
}

#[test]
fn test_exif_segment_does_not_disturb_decoding() {
    let handle = ImageHandle::from_bytes("camera.jpg", camera_jpeg("EOS R5")).unwrap();
    assert_eq!(handle.dimensions(), (64, 48));
}

#[test]
fn test_model_change_is_reported() {
    let query = ImageHandle::from_bytes("query.jpg", camera_jpeg("EOS R6")).unwrap();
    let original = ImageHandle::from_bytes("original.jpg", camera_jpeg("EOS R5")).unwrap();

    let comparison = compare_metadata(&ExifExtractor, &query, &original);
    assert!(!comparison.matches);
    assert_eq!(comparison.issues, vec!["Camera model: EOS R5 → EOS R6"]);
}

#[test]
fn test_model_change_verdict_is_metadata_mismatch() {
    let query = ImageSource::from_bytes("query.jpg", camera_jpeg("EOS R6"));
    let original = ImageSource::from_bytes("original.jpg", camera_jpeg("EOS R5"));

    let results = Verifier::new().verify(&query, &[original]);
    let result = &results[0];

    assert_eq!(result.pixel_distance, Some(0));
    assert!(!result.metadata_match);
    assert_eq!(result.metadata_issues, vec!["Camera model: EOS R5 → EOS R6"]);
    assert_eq!(result.overall_confidence, ConfidenceLabel::MetadataMismatch);
}

#[test]
fn test_query_without_exif_reports_every_original_field_missing() {
    let query = ImageHandle::from_bytes("stripped.jpg", gradient_jpeg()).unwrap();
    let original = ImageHandle::from_bytes("original.jpg", camera_jpeg("EOS R5")).unwrap();

    let comparison = compare_metadata(&ExifExtractor, &query, &original);
    assert_eq!(
        comparison.issues,
        vec![
            "Capture time: 2024:01:15 12:30:45 → Missing",
            "Camera make: Canon → Missing",
            "Camera model: EOS R5 → Missing",
            "Software: FW1.0 → Missing",
        ]
    );
}

#[test]
fn test_truncated_ifd_is_metadata_error() {
    let err = ExifExtractor.extract(&truncated_jpeg()).unwrap_err();
    assert!(matches!(err, VisionError::Metadata(_)));
}

#[test]
fn test_truncated_ifd_becomes_single_read_error_issue() {
    let query = ImageHandle::from_bytes("query.jpg", camera_jpeg("EOS R5")).unwrap();
    let original = ImageHandle::from_bytes("original.jpg", truncated_jpeg()).unwrap();

    let comparison = compare_metadata(&ExifExtractor, &query, &original);
    assert!(!comparison.matches);
    assert_eq!(comparison.issues.len(), 1);
    assert!(comparison.issues[0].starts_with("Metadata read error:"));
}
