//! CLI integration tests for visioncop-cli.
//!
//! These tests run the actual binary against synthetic images and check
//! outputs and exit codes.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the visioncop binary.
fn visioncop() -> Command {
    Command::cargo_bin("visioncop").unwrap()
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) * 255 / (width + height)) as u8,
        ])
    })
}

fn write_image(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    visioncop()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Image similarity search and authenticity verification",
        ))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_version_displays_version() {
    visioncop()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("visioncop"));
}

#[test]
fn test_help_shows_exit_codes() {
    visioncop()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"))
        .stdout(predicate::str::contains("74"));
}

#[test]
fn test_verify_help_shows_options() {
    visioncop()
        .args(["verify", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("QUERY"))
        .stdout(predicate::str::contains("CANDIDATES"))
        .stdout(predicate::str::contains("--strict"));
}

#[test]
fn test_verify_requires_candidates() {
    visioncop().args(["verify", "query.png"]).assert().code(2);
}

// ============================================================================
// Verify Tests
// ============================================================================

#[test]
fn test_verify_same_file_is_perfectly_authentic() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "photo.png", &gradient(90, 70));
    let image = image.to_str().unwrap();

    visioncop()
        .args(["--color=never", "verify", image, image])
        .assert()
        .success()
        .stdout(predicate::str::contains("Perfectly Authentic"))
        .stdout(predicate::str::contains("Pixel distance: 0 (Identical)"));
}

#[test]
fn test_verify_json_output() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "photo.png", &gradient(90, 70));
    let missing = temp.path().join("missing.png");

    let json = json_stdout(visioncop().args([
        "--json",
        "verify",
        image.to_str().unwrap(),
        missing.to_str().unwrap(),
        image.to_str().unwrap(),
    ]));

    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["pixel_distance"], 0);
    assert_eq!(results[0]["overall_confidence"], "Perfectly Authentic");
    assert_eq!(results[0]["severity_color"], "green");
    assert_eq!(results[2]["filename"], "missing.png");
    assert_eq!(results[2]["pixel_distance"], -1);
    assert_eq!(results[2]["overall_confidence"], "Verification Failed");
}

#[test]
fn test_verify_missing_query_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "photo.png", &gradient(40, 40));

    visioncop()
        .args(["verify", "nonexistent_query.png", image.to_str().unwrap()])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read query image"));
}

#[test]
fn test_verify_undecodable_query_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let bogus = temp.path().join("bogus.jpg");
    fs::write(&bogus, b"definitely not a jpeg").unwrap();
    let image = write_image(temp.path(), "photo.png", &gradient(40, 40));

    visioncop()
        .args(["verify", bogus.to_str().unwrap(), image.to_str().unwrap()])
        .assert()
        .code(66);
}

#[test]
fn test_verify_strict_flags_manipulated_query() {
    let temp = TempDir::new().unwrap();
    // Flat fill on a block-aligned canvas scores 0.8 on its own.
    let flat = write_image(
        temp.path(),
        "flat.png",
        &RgbImage::from_pixel(160, 120, Rgb([128, 128, 128])),
    );
    let original = write_image(temp.path(), "original.png", &gradient(160, 120));

    let args = [flat.to_str().unwrap(), original.to_str().unwrap()];

    visioncop()
        .arg("verify")
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("Definitely Manipulated"));

    visioncop()
        .args(["verify", "--strict"])
        .args(args)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("flagged"));
}

// ============================================================================
// Analyze Tests
// ============================================================================

#[test]
fn test_analyze_json_report() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "scan.png", &gradient(64, 48));

    let json = json_stdout(visioncop().args(["--json", "analyze", image.to_str().unwrap()]));
    assert_eq!(json["filename"], "scan.png");
    assert_eq!(json["width"], 64);
    assert_eq!(json["height"], 48);
    assert_eq!(json["sha3_256"].as_str().unwrap().len(), 64);
    assert_eq!(json["perceptual_hash"].as_str().unwrap().len(), 16);
    assert!(json["manipulation"]["score"].as_f64().unwrap() <= 1.0);
}

#[test]
fn test_quiet_analyze_prints_hash_only() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "scan.png", &gradient(64, 48));

    visioncop()
        .args(["--quiet", "analyze", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9a-f]{16}\n$").unwrap());
}

#[test]
fn test_color_never_no_ansi() {
    let temp = TempDir::new().unwrap();
    let image = write_image(temp.path(), "scan.png", &gradient(64, 48));

    visioncop()
        .args(["--color=never", "analyze", image.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b[").not());
}

// ============================================================================
// Index Tests
// ============================================================================

#[test]
fn test_index_empty_directory_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.cbor");
    let empty = temp.path().join("empty");
    fs::create_dir(&empty).unwrap();

    visioncop()
        .args([
            "--index",
            index.to_str().unwrap(),
            "index",
            empty.to_str().unwrap(),
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("No supported images"));
}

#[test]
fn test_corrupt_index_returns_io_error() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.cbor");
    fs::write(&index, b"\xff\x00 garbage").unwrap();

    visioncop()
        .args(["--index", index.to_str().unwrap(), "status"])
        .assert()
        .code(74)
        .stderr(predicate::str::contains("index file"));
}

#[test]
fn test_status_on_fresh_index() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.cbor");

    let json = json_stdout(visioncop().args(["--json", "--index", index.to_str().unwrap(), "status"]));
    assert_eq!(json["entries"], 0);
    assert_eq!(json["model"], "colour-layout-v1");
    // Reading status never creates the file.
    assert!(!index.exists());
}

#[test]
fn test_list_on_fresh_index_is_empty() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.cbor");

    let json = json_stdout(visioncop().args(["--json", "--index", index.to_str().unwrap(), "list"]));
    assert_eq!(json, serde_json::json!([]));
}

#[test]
fn test_remove_unknown_path_returns_input_error() {
    let temp = TempDir::new().unwrap();
    let index = temp.path().join("index.cbor");

    visioncop()
        .args(["--index", index.to_str().unwrap(), "remove", "/nope/never-indexed.png"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Not in the index"));
}
