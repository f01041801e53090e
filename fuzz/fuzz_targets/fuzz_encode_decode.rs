//! Fuzz target for the k-mer codec's round trip and rejection behavior.
//!
//! `encode` must never panic on arbitrary bytes: it either accepts a
//! well-formed ACGT buffer (and `decode` recovers it exactly) or reports
//! the position of the first offending byte.

#![no_main]

use gambit::kmer::{decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 32 {
        return;
    }
    let k = data.len() as u8;

    match encode(data, k) {
        Ok(idx) => {
            let decoded = decode(idx, k);
            let normalized: Vec<u8> = data.iter().map(u8::to_ascii_uppercase).collect();
            assert_eq!(decoded, normalized, "encode/decode round trip mismatch");
        }
        Err(gambit::error::GambitError::InvalidNucleotide { base, position }) => {
            assert!(position < data.len(), "error position out of bounds");
            assert_eq!(base, data[position], "error byte mismatch at reported position");
            assert!(
                !matches!(base, b'A' | b'a' | b'C' | b'c' | b'G' | b'g' | b'T' | b't'),
                "rejected a valid ACGT byte"
            );
        }
        Err(other) => panic!("unexpected error variant from encode: {other:?}"),
    }
});
