#![no_main]

//! Fuzz target for Verifier::verify()
//!
//! The input is split in two and used as query and candidate. Whatever the
//! bytes, exactly one result must come back.
//!
//! Run with: cargo +nightly fuzz run fuzz_compare

use libfuzzer_sys::fuzz_target;
use visioncop_core::{ImageSource, Verifier};

fuzz_target!(|data: &[u8]| {
    let (query, candidate) = data.split_at(data.len() / 2);
    let results = Verifier::new().verify(
        &ImageSource::from_bytes("query", query.to_vec()),
        &[ImageSource::from_bytes("candidate", candidate.to_vec())],
    );
    assert_eq!(results.len(), 1);
});
