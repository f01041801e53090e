//! Property-based tests using proptest.
//!
//! These exercise the universal properties listed in the core design: k-mer
//! codec round trips, Jaccard distance's metric-like properties, and the
//! signature builder's sortedness/bounds/reverse-complement-symmetry
//! invariants, across randomly generated inputs rather than fixed examples.

use gambit::jaccard::jaccard_distance;
use gambit::kmer::{decode, encode, revcomp, KmerSpec};
use gambit::signature::calc_signature;
use proptest::prelude::*;

fn dna_sequence(min_len: usize, max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')], min_len..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

fn kmer_length() -> impl Strategy<Value = u8> {
    1u8..=32
}

fn sorted_index_set(max_len: usize, bound: u64) -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::hash_set(0..bound.max(1), 0..=max_len).prop_map(|set| {
        let mut v: Vec<u64> = set.into_iter().collect();
        v.sort_unstable();
        v
    })
}

proptest! {
    /// Round trip: decode(encode(m, k), k) == uppercase(m), for any k-mer
    /// over {A,C,G,T}.
    #[test]
    fn encode_decode_roundtrip(seq in kmer_length().prop_flat_map(|k| dna_sequence(k as usize, k as usize))) {
        let k = seq.len() as u8;
        let idx = encode(seq.as_bytes(), k).unwrap();
        prop_assert_eq!(decode(idx, k), seq.as_bytes());
    }

    /// `revcomp` is an involution on any byte string (ACGT or not).
    #[test]
    fn revcomp_is_an_involution(seq in dna_sequence(0, 64)) {
        prop_assert_eq!(revcomp(&revcomp(seq.as_bytes())), seq.as_bytes());
    }

    /// Jaccard distance is always in [0, 1] and symmetric.
    #[test]
    fn jaccard_distance_is_bounded_and_symmetric(
        a in sorted_index_set(50, 1000),
        b in sorted_index_set(50, 1000),
    ) {
        let d_ab = jaccard_distance(&a, &b);
        let d_ba = jaccard_distance(&b, &a);
        prop_assert!((0.0..=1.0).contains(&d_ab));
        prop_assert_eq!(d_ab, d_ba);
    }

    /// Jaccard distance of any sorted array against itself is zero.
    #[test]
    fn jaccard_distance_identity(a in sorted_index_set(50, 1000)) {
        prop_assert_eq!(jaccard_distance(&a, &a), 0.0);
    }

    /// A signature is always strictly sorted and every k-mer index is
    /// within `[0, nkmers)`.
    #[test]
    fn signature_is_sorted_and_bounded(seq in dna_sequence(0, 200)) {
        let spec = KmerSpec::new(b"ATGAC", 5).unwrap();
        let sig = calc_signature(&spec, [seq.as_str()]);
        for w in sig.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
        let nkmers = spec.nkmers();
        for &v in &sig {
            prop_assert!(u128::from(v) < nkmers);
        }
    }

    /// A signature built from a sequence equals the signature built from
    /// its reverse complement (set equality): both strands are sampled
    /// equivalently.
    #[test]
    fn signature_is_reverse_complement_symmetric(seq in dna_sequence(10, 200)) {
        let spec = KmerSpec::new(b"ATGAC", 5).unwrap();
        let forward = calc_signature(&spec, [seq.as_str()]);
        let rc = String::from_utf8(revcomp(seq.as_bytes())).unwrap();
        let reversed = calc_signature(&spec, [rc.as_str()]);
        prop_assert_eq!(forward, reversed);
    }
}
