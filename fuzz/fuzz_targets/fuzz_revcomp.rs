//! Fuzz target for `revcomp`'s involution property and `encode_revcomp`'s
//! agreement with a materialized reverse complement, over arbitrary bytes
//! (not just ACGT).

#![no_main]

use gambit::kmer::{encode, encode_revcomp, revcomp};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    assert_eq!(revcomp(&revcomp(data)), data, "revcomp is not an involution");

    if data.is_empty() || data.len() > 32 {
        return;
    }
    let k = data.len() as u8;
    let rc = revcomp(data);
    match (encode_revcomp(data, k), encode(&rc, k)) {
        (Ok(a), Ok(b)) => assert_eq!(a, b, "encode_revcomp disagrees with encode(revcomp(..))"),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("encode_revcomp and encode(revcomp(..)) disagreed on success: {a:?} vs {b:?}"),
    }
});
