//! Single-image manipulation heuristics.
//!
//! Four independent checks run in a fixed order and each may add to the
//! suspicion score and append one flag (the histogram check may add up to
//! three). The final score is clamped to 1.0.
//!
//! The thresholds and weights below are empirical calibration constants.
//! They are kept at their established values for compatibility and are not
//! statistically validated.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::media::ImageHandle;

/// Grayscale standard deviation below which brightness is "too flat".
pub const FLAT_BRIGHTNESS_STD: f64 = 30.0;
pub const FLAT_BRIGHTNESS_WEIGHT: f64 = 0.3;

/// Grayscale standard deviation above which brightness is "too noisy".
pub const NOISY_BRIGHTNESS_STD: f64 = 80.0;
pub const NOISY_BRIGHTNESS_WEIGHT: f64 = 0.2;

/// JPEG block edge in pixels.
pub const BLOCK_SIZE: u32 = 8;
/// Both dimensions must exceed this for the block-alignment check to fire.
pub const BLOCK_MIN_DIMENSION: u32 = 100;
pub const BLOCK_ALIGNMENT_WEIGHT: f64 = 0.2;

/// Fraction of a channel's pixels a single histogram bin may hold.
pub const HISTOGRAM_PEAK_FRACTION: f64 = 0.10;
pub const HISTOGRAM_PEAK_WEIGHT: f64 = 0.1;

/// Quality used to re-encode the image for error-level analysis.
pub const ELA_JPEG_QUALITY: u8 = 95;
/// Normalized mean difference above which ELA contributes to the score.
pub const ELA_THRESHOLD: f64 = 0.05;

/// Upper bound of the suspicion score.
pub const MAX_SCORE: f64 = 1.0;

/// Suspicion score in [0, 1] plus one flag per heuristic that fired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManipulationEvidence {
    pub score: f64,
    pub flags: Vec<String>,
}

impl ManipulationEvidence {
    fn add(&mut self, increment: f64, flag: String) {
        self.score = (self.score + increment).min(MAX_SCORE);
        self.flags.push(flag);
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Runs the manipulation heuristics.
#[derive(Debug, Clone, Copy)]
pub struct ManipulationScorer {
    ela_quality: u8,
}

impl ManipulationScorer {
    pub fn new() -> Self {
        Self {
            ela_quality: ELA_JPEG_QUALITY,
        }
    }

    /// Override the ELA re-encode quality (1-100).
    pub fn with_ela_quality(mut self, quality: u8) -> Self {
        self.ela_quality = quality.clamp(1, 100);
        self
    }

    pub fn score(&self, image: &ImageHandle) -> ManipulationEvidence {
        self.score_image(image.pixels())
    }

    pub fn score_image(&self, image: &DynamicImage) -> ManipulationEvidence {
        let rgb = image.to_rgb8();
        let gray = image.to_luma8();
        let mut evidence = ManipulationEvidence::default();

        // 1. Brightness uniformity
        let std_dev = brightness_std(&gray);
        if std_dev < FLAT_BRIGHTNESS_STD {
            evidence.add(
                FLAT_BRIGHTNESS_WEIGHT,
                "Unusually uniform brightness (possible smoothing or retouching)".into(),
            );
        } else if std_dev > NOISY_BRIGHTNESS_STD {
            evidence.add(
                NOISY_BRIGHTNESS_WEIGHT,
                "Highly variable brightness (possible noise injection)".into(),
            );
        }

        // 2. Block alignment
        if is_block_aligned(rgb.width(), rgb.height()) {
            evidence.add(
                BLOCK_ALIGNMENT_WEIGHT,
                "JPEG blocking artifacts detected".into(),
            );
        }

        // 3. Per-channel histogram concentration
        for channel in concentrated_channels(&rgb) {
            evidence.add(
                HISTOGRAM_PEAK_WEIGHT,
                format!("Channel {} histogram concentrated in a single bin", channel),
            );
        }

        // 4. Error-level analysis; skipped when re-encoding fails
        if let Some(level) = error_level(&rgb, self.ela_quality) {
            if level > ELA_THRESHOLD {
                evidence.add(level, format!("Error level analysis score: {:.3}", level));
            }
        }

        debug!(
            score = evidence.score,
            flags = evidence.flags.len(),
            brightness_std = std_dev,
            "Scored manipulation heuristics"
        );
        evidence
    }
}

impl Default for ManipulationScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Score a loaded image with default settings.
pub fn score_manipulation(image: &ImageHandle) -> ManipulationEvidence {
    ManipulationScorer::new().score(image)
}

/// Population standard deviation of grayscale intensity.
pub fn brightness_std(gray: &GrayImage) -> f64 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    let n = pixels.len() as f64;
    let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / n;
    let variance = pixels
        .iter()
        .map(|&p| {
            let d = p as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

/// Both dimensions are multiples of the JPEG block size and larger than the minimum.
pub fn is_block_aligned(width: u32, height: u32) -> bool {
    width > BLOCK_MIN_DIMENSION
        && height > BLOCK_MIN_DIMENSION
        && width % BLOCK_SIZE == 0
        && height % BLOCK_SIZE == 0
}

/// Indices of RGB channels whose fullest histogram bin exceeds the peak fraction.
pub fn concentrated_channels(rgb: &RgbImage) -> Vec<usize> {
    let total = (rgb.width() as u64) * (rgb.height() as u64);
    if total == 0 {
        return Vec::new();
    }

    let mut histograms = [[0u64; 256]; 3];
    for pixel in rgb.pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            histograms[channel][value as usize] += 1;
        }
    }

    histograms
        .iter()
        .enumerate()
        .filter(|(_, hist)| {
            let peak = hist.iter().copied().max().unwrap_or(0);
            peak as f64 / total as f64 > HISTOGRAM_PEAK_FRACTION
        })
        .map(|(channel, _)| channel)
        .collect()
}

/// Mean absolute difference between the image and a JPEG re-encode of it,
/// normalized to [0, 1]. `None` when the round trip fails.
pub fn error_level(rgb: &RgbImage, quality: u8) -> Option<f64> {
    if rgb.as_raw().is_empty() {
        return None;
    }

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    if let Err(e) = rgb.write_with_encoder(encoder) {
        debug!(error = %e, "ELA re-encode failed, skipping");
        return None;
    }

    let recompressed = match image::load_from_memory_with_format(buffer.get_ref(), ImageFormat::Jpeg)
    {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            debug!(error = %e, "ELA decode failed, skipping");
            return None;
        }
    };
    if recompressed.dimensions() != rgb.dimensions() {
        return None;
    }

    let total: u64 = rgb
        .as_raw()
        .iter()
        .zip(recompressed.as_raw())
        .map(|(&a, &b)| a.abs_diff(b) as u64)
        .sum();
    let mean = total as f64 / rgb.as_raw().len() as f64;
    Some(mean / 255.0)
}
