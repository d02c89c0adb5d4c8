#![no_main]

//! Fuzz target for ExifExtractor::extract()
//!
//! Arbitrary bytes must yield a record or a Metadata error, never a panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_metadata

use libfuzzer_sys::fuzz_target;
use visioncop_core::{ExifExtractor, MetadataExtractor};

fuzz_target!(|data: &[u8]| {
    let _ = ExifExtractor.extract(data);
});
