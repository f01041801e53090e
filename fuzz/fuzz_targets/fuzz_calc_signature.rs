//! Fuzz target for the signature builder: scanning arbitrary byte strings
//! (not restricted to ACGT — contigs may contain `N` and other ambiguity
//! codes) must never panic, and the resulting signature must always be
//! strictly sorted and bounded by `4^k`.

#![no_main]

use gambit::kmer::KmerSpec;
use gambit::signature::calc_signature;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }
    let spec = KmerSpec::new(b"ATGAC", 5).expect("fixed spec is always valid");
    let seq = String::from_utf8_lossy(data);
    let sig = calc_signature(&spec, [seq.as_ref()]);

    for w in sig.windows(2) {
        assert!(w[0] < w[1], "signature is not strictly sorted");
    }
    let nkmers = spec.nkmers();
    for &v in &sig {
        assert!(u128::from(v) < nkmers, "k-mer index out of range");
    }
});
