//! Image embeddings for similarity search.
//!
//! [`EmbeddingModel`] is an explicit resource handle: construct it once at
//! startup and share it by reference (usually behind an `Arc`). Its lookup
//! tables are built on first use through a [`OnceLock`], so initialization is
//! idempotent and safe to race from several threads.
//!
//! The descriptor is a deterministic colour-layout vector: a quantized joint
//! RGB histogram followed by a mean-centred grayscale thumbnail, L2-normalized
//! so that dot product equals cosine similarity.

use std::sync::OnceLock;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info};

/// Name reported by [`EmbeddingModel::model_name`].
pub const MODEL_NAME: &str = "colour-layout-v1";

/// Producer of unit-length embedding vectors.
pub trait Embedder: Send + Sync {
    /// `None` when no embedding can be produced (e.g. undecodable input).
    fn embed(&self, image_bytes: &[u8]) -> Option<Vec<f32>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Descriptor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Side of the square grayscale thumbnail.
    pub thumbnail_size: u32,
    /// Levels per colour channel in the joint histogram.
    pub histogram_bins: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 16,
            histogram_bins: 4,
        }
    }
}

impl ModelConfig {
    pub fn histogram_len(&self) -> usize {
        (self.histogram_bins as usize).pow(3)
    }

    pub fn thumbnail_len(&self) -> usize {
        (self.thumbnail_size as usize).pow(2)
    }

    pub fn dimension(&self) -> usize {
        self.histogram_len() + self.thumbnail_len()
    }
}

/// Tables derived from the config, built once.
struct Tables {
    /// Maps an 8-bit channel value to its histogram level.
    quantize: [u8; 256],
}

/// Deterministic colour-layout embedding model.
pub struct EmbeddingModel {
    config: ModelConfig,
    tables: OnceLock<Tables>,
}

impl EmbeddingModel {
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    pub fn with_config(config: ModelConfig) -> Self {
        let config = ModelConfig {
            thumbnail_size: config.thumbnail_size.max(1),
            histogram_bins: config.histogram_bins.clamp(1, 256),
        };
        Self {
            config,
            tables: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Build the lookup tables now instead of on first embed.
    pub fn warm_up(&self) {
        self.tables();
    }

    pub fn is_loaded(&self) -> bool {
        self.tables.get().is_some()
    }

    fn tables(&self) -> &Tables {
        self.tables.get_or_init(|| {
            let bins = self.config.histogram_bins;
            let mut quantize = [0u8; 256];
            for (value, level) in quantize.iter_mut().enumerate() {
                *level = (value as u32 * bins / 256) as u8;
            }
            info!(
                model = MODEL_NAME,
                dimension = self.config.dimension(),
                "Embedding model initialized"
            );
            Tables { quantize }
        })
    }

    /// Embed already-decoded pixels.
    pub fn embed_image(&self, image: &DynamicImage) -> Option<Vec<f32>> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        let tables = self.tables();
        let bins = self.config.histogram_bins as usize;

        let rgb = image.to_rgb8();
        let mut histogram = vec![0f32; self.config.histogram_len()];
        for pixel in rgb.pixels() {
            let [r, g, b] = pixel.0.map(|c| tables.quantize[c as usize] as usize);
            histogram[(r * bins + g) * bins + b] += 1.0;
        }
        let total = (rgb.width() * rgb.height()) as f32;
        histogram.iter_mut().for_each(|h| *h /= total);

        let side = self.config.thumbnail_size;
        let thumb = image.resize_exact(side, side, FilterType::Triangle).to_luma8();
        let mean = thumb.as_raw().iter().map(|&p| p as f32).sum::<f32>()
            / thumb.as_raw().len() as f32;
        let layout = thumb.as_raw().iter().map(|&p| (p as f32 - mean) / 255.0);

        let mut vector: Vec<f32> = histogram.into_iter().chain(layout).collect();
        normalize(&mut vector);
        Some(vector)
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingModel")
            .field("config", &self.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Embedder for EmbeddingModel {
    fn embed(&self, image_bytes: &[u8]) -> Option<Vec<f32>> {
        match image::load_from_memory(image_bytes) {
            Ok(image) => self.embed_image(&image),
            Err(e) => {
                debug!(error = %e, "Cannot embed undecodable image");
                None
            }
        }
    }

    fn dimension(&self) -> usize {
        self.config.dimension()
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}

/// Scale to unit L2 norm. A zero vector gets one unit in its first slot so
/// every embedding has length 1.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vector.iter_mut().for_each(|v| *v /= norm);
    } else if !vector.is_empty() {
        vector.iter_mut().for_each(|v| *v = 0.0);
        vector[0] = 1.0;
    }
}

/// Dot product. Equals cosine similarity for unit vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
