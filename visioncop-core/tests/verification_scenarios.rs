//! End-to-end verification scenarios on synthetic images.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use visioncop_core::{
    sort_results, ConfidenceLabel, EmbeddingModel, FileVectorStore, ImageHandle, ImageSource,
    ManipulationScorer, MetadataExtractor, MetadataField, MetadataRecord, PixelStatus,
    SearchEngine, SeverityColor, VerificationResult, Verifier, VisionError,
};

/// Smooth gradient that trips none of the manipulation heuristics.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) * 255 / (width + height)) as u8,
        ])
    })
}

fn checkerboard(width: u32, height: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgb([240, 240, 240])
        } else {
            Rgb([15, 15, 15])
        }
    })
}

fn save(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

/// Metadata keyed by container format, so identical pixels can carry
/// different capture records.
struct ByFormat;

impl MetadataExtractor for ByFormat {
    fn extract(&self, image_bytes: &[u8]) -> visioncop_core::Result<MetadataRecord> {
        let record = MetadataRecord::new().with(MetadataField::CameraMake, "Canon");
        Ok(match image::guess_format(image_bytes) {
            Ok(ImageFormat::Png) => record.with(MetadataField::CameraModel, "EOS R5"),
            Ok(ImageFormat::Bmp) => record.with(MetadataField::Software, "GIMP 2.10"),
            _ => MetadataRecord::new(),
        })
    }
}

struct Unreadable;

impl MetadataExtractor for Unreadable {
    fn extract(&self, _image_bytes: &[u8]) -> visioncop_core::Result<MetadataRecord> {
        Err(VisionError::Metadata("IFD entry out of bounds".into()))
    }
}

#[test]
fn test_same_file_is_perfectly_authentic() {
    let dir = TempDir::new().unwrap();
    let path = save(dir.path(), "photo.png", &gradient(90, 70));

    let results = Verifier::new().verify(
        &ImageSource::from_path(&path),
        &[ImageSource::from_path(&path)],
    );

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.filename, "photo.png");
    assert_eq!(result.pixel_distance, Some(0));
    assert_eq!(result.pixel_status, PixelStatus::Identical);
    assert!(result.metadata_match);
    assert!(result.metadata_issues.is_empty());
    assert!(result.manipulation_score < 0.05, "score {}", result.manipulation_score);
    assert_eq!(result.overall_confidence, ConfidenceLabel::PerfectlyAuthentic);
    assert_eq!(result.severity_color, SeverityColor::Green);
}

#[test]
fn test_results_sorted_by_distance_with_failures_last() {
    let dir = TempDir::new().unwrap();
    let base = gradient(96, 80);
    let query = save(dir.path(), "query.png", &base);
    let copy = save(dir.path(), "copy.png", &base);
    let other = save(dir.path(), "other.png", &checkerboard(96, 80, 12));
    let missing = dir.path().join("missing.png");

    let candidates = vec![
        ImageSource::from_path(&missing),
        ImageSource::from_path(&other),
        ImageSource::from_path(&copy),
    ];
    let results = Verifier::new().verify(&ImageSource::from_path(&query), &candidates);

    let names: Vec<_> = results.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["copy.png", "other.png", "missing.png"]);
    assert_eq!(results[0].pixel_distance, Some(0));
    assert!(results[1].pixel_distance.unwrap() > 0);

    let failed = &results[2];
    assert_eq!(failed.rendered_distance(), -1);
    assert_eq!(failed.overall_confidence, ConfidenceLabel::VerificationFailed);
    assert_eq!(failed.severity_color, SeverityColor::Gray);
    assert!(failed.failure.is_some());
}

#[test]
fn test_sort_order_for_known_distances() {
    let mut results: Vec<VerificationResult> = [12, 0, 31]
        .iter()
        .map(|d| {
            serde_json::from_value(serde_json::json!({
                "filename": format!("d{}.png", d),
                "pixel_distance": d,
                "pixel_status": "Identical",
                "metadata_match": true,
                "metadata_issues": [],
                "manipulation_score": 0.0,
                "manipulation_flags": [],
                "overall_confidence": "Perfectly Authentic",
                "severity_color": "green"
            }))
            .unwrap()
        })
        .collect();

    sort_results(&mut results);
    let distances: Vec<_> = results.iter().map(|r| r.rendered_distance()).collect();
    assert_eq!(distances, vec![0, 12, 31]);
}

#[test]
fn test_identical_pixels_with_metadata_mismatch() {
    let img = gradient(90, 70);
    let query = ImageSource::from_bytes("query.bmp", encode(&img, ImageFormat::Bmp));
    let original = ImageSource::from_bytes("original.png", encode(&img, ImageFormat::Png));

    let verifier = Verifier::new().with_extractor(Arc::new(ByFormat));
    let results = verifier.verify(&query, &[original]);
    let result = &results[0];

    assert_eq!(result.pixel_distance, Some(0));
    assert!(!result.metadata_match);
    assert_eq!(result.metadata_issues, vec!["Camera model: EOS R5 → Missing"]);
    assert!(result.manipulation_score <= 0.7);
    assert_eq!(result.overall_confidence, ConfidenceLabel::MetadataMismatch);
    assert_eq!(result.severity_color, SeverityColor::Red);
}

#[test]
fn test_metadata_read_error_does_not_block_pixel_comparison() {
    let img = gradient(90, 70);
    let bytes = encode(&img, ImageFormat::Png);
    let verifier = Verifier::new().with_extractor(Arc::new(Unreadable));

    let results = verifier.verify(
        &ImageSource::from_bytes("q.png", bytes.clone()),
        &[ImageSource::from_bytes("c.png", bytes)],
    );
    let result = &results[0];

    assert_eq!(result.pixel_distance, Some(0));
    assert!(!result.metadata_match);
    assert_eq!(
        result.metadata_issues,
        vec!["Metadata read error: IFD entry out of bounds"]
    );
    assert_eq!(result.overall_confidence, ConfidenceLabel::MetadataMismatch);
}

#[test]
fn test_undecodable_candidate_degrades_single_result() {
    let img = gradient(64, 64);
    let good = encode(&img, ImageFormat::Png);

    let results = Verifier::new().verify(
        &ImageSource::from_bytes("q.png", good.clone()),
        &[
            ImageSource::from_bytes("broken.jpg", b"\xff\xd8 truncated".to_vec()),
            ImageSource::from_bytes("good.png", good),
        ],
    );

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].filename, "good.png");
    assert_eq!(results[1].filename, "broken.jpg");
    assert_eq!(results[1].pixel_status, PixelStatus::VerificationFailed);
    assert!(results[1]
        .failure
        .as_deref()
        .unwrap()
        .contains("Failed to decode image 'broken.jpg'"));
}

#[test]
fn test_manipulation_score_always_in_unit_range() {
    let scorer = ManipulationScorer::new();
    let images = [
        RgbImage::from_pixel(160, 120, Rgb([128, 128, 128])),
        checkerboard(160, 160, 1),
        checkerboard(101, 77, 9),
        gradient(200, 50),
        RgbImage::from_fn(64, 64, |x, y| {
            let v = ((x * 7919 + y * 104_729) % 256) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
        }),
    ];
    for img in images {
        let evidence = scorer.score_image(&DynamicImage::ImageRgb8(img));
        assert!(
            (0.0..=1.0).contains(&evidence.score),
            "score out of range: {}",
            evidence.score
        );
    }
}

#[test]
fn test_distance_five_is_near_identical() {
    assert_eq!(PixelStatus::from_distance(Some(5)), PixelStatus::NearIdentical);
    assert_eq!(PixelStatus::from_distance(Some(6)), PixelStatus::HighSimilarity);
    assert_eq!(
        PixelStatus::from_distance(Some(30)),
        PixelStatus::ModerateSimilarity
    );
    assert_eq!(
        PixelStatus::from_distance(Some(31)),
        PixelStatus::DifferentContent
    );
}

#[test]
fn test_original_without_metadata_is_vacuous_match() {
    let img = gradient(80, 60);
    let query = ImageHandle::from_image("q.png", DynamicImage::ImageRgb8(img.clone())).unwrap();
    let original = ImageHandle::from_image("o.png", DynamicImage::ImageRgb8(img)).unwrap();

    let result = Verifier::new().compare(&query, &original);
    assert!(result.metadata_match);
    assert!(result.metadata_issues.is_empty());
}

#[test]
fn test_analyze_reports_fingerprints() {
    let img = gradient(90, 70);
    let handle = ImageHandle::from_image("scan.png", DynamicImage::ImageRgb8(img)).unwrap();
    let report = Verifier::new().analyze(&handle).unwrap();

    assert_eq!(report.filename, "scan.png");
    assert_eq!((report.width, report.height), (90, 70));
    assert_eq!(report.sha3_256, visioncop_core::sha3_hex(handle.bytes()));
    assert!(report.metadata.is_empty());
}

#[test]
fn test_search_then_verify_hits() {
    let dir = TempDir::new().unwrap();
    let engine = SearchEngine::new(
        Arc::new(EmbeddingModel::new()),
        Arc::new(FileVectorStore::open(dir.path().join("index.cbor")).unwrap()),
    );

    let images = [
        ("gradient.png", gradient(90, 70)),
        ("board.png", checkerboard(90, 70, 10)),
    ];
    let mut paths = Vec::new();
    for (name, img) in &images {
        let path = save(dir.path(), name, img);
        engine.index(name, &std::fs::read(&path).unwrap()).unwrap();
        paths.push(path);
    }

    let query_bytes = encode(&gradient(90, 70), ImageFormat::Png);
    let hits = engine.search(&query_bytes, 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "gradient.png");

    let candidates: Vec<_> = hits
        .iter()
        .map(|h| ImageSource::from_path(dir.path().join(&h.id)))
        .collect();
    let results =
        Verifier::new().verify(&ImageSource::from_bytes("query.png", query_bytes), &candidates);
    assert_eq!(results[0].overall_confidence, ConfidenceLabel::PerfectlyAuthentic);
}
