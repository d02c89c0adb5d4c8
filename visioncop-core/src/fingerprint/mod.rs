//! Pixel-content fingerprints.
//!
//! Perceptual hashes gauge visual similarity via Hamming distance. They are
//! stable under re-encoding at the same resolution but not under crops or
//! rotations beyond a minor degree.

pub mod perceptual;

pub use perceptual::*;
