//! Signature builder.
//!
//! Scans a nucleotide stream for prefix-anchored k-mers on both strands and
//! collapses the hits into a sorted, deduplicated set of k-mer indices — a
//! genome's "signature" under a given [`KmerSpec`](crate::kmer::KmerSpec).

use rustc_hash::FxHashSet;

use crate::concurrency::WorkerPool;
use crate::kmer::{self, KmerSpec};
use crate::progress::CancellationToken;

/// A genome signature: the sorted, deduplicated set of k-mer indices
/// extracted under one [`KmerSpec`]. Always widened to `u64` in memory;
/// narrowing to the spec's `index_dtype` happens only at the store boundary
/// (`crate::store`).
pub type Signature = Vec<u64>;

/// Scans `sequences` (e.g. the contigs of one genome assembly) for
/// prefix-anchored k-mers on both strands and returns the resulting
/// signature.
///
/// Per sequence: finds every exact occurrence of `spec.prefix()` and of its
/// reverse complement. A forward hit at position `p` contributes the `k`
/// bytes immediately following the prefix, encoded with [`kmer::encode`]. A
/// reverse-complement hit at position `p` contributes the `k` bytes
/// immediately preceding it, encoded with [`kmer::encode_revcomp`]. Either
/// way, a candidate k-mer containing a non-ACGT byte (typically `N`) is
/// silently discarded — it is neither an error nor counted, per the
/// documented skip policy (see `crate::error`).
#[must_use]
pub fn calc_signature<S: AsRef<[u8]>>(spec: &KmerSpec, sequences: impl IntoIterator<Item = S>) -> Signature {
    let mut set: FxHashSet<u64> = FxHashSet::default();
    for seq in sequences {
        scan_one(spec, seq.as_ref(), &mut set);
    }
    let mut signature: Signature = set.into_iter().collect();
    signature.sort_unstable();
    signature
}

/// Scans the genomes of multiple assemblies in parallel, returning one
/// signature per input in the same order.
///
/// Each genome is built on a worker thread from `pool`; the token is polled
/// between genomes so a caller can cancel a large batch without waiting for
/// every genome to finish. A cancelled call returns `None` in place of the
/// signatures that were not completed — callers that need an all-or-nothing
/// batch should check for any `None` and discard the whole batch themselves.
pub fn calc_signatures_parallel<G, S>(
    spec: &KmerSpec,
    genomes: &[G],
    pool: &WorkerPool,
    token: &CancellationToken,
) -> Vec<Option<Signature>>
where
    G: AsRef<[S]> + Sync,
    S: AsRef<[u8]> + Sync,
{
    pool.install(|| {
        use rayon::prelude::*;
        genomes
            .par_iter()
            .map(|genome| {
                if token.is_cancelled() {
                    return None;
                }
                Some(calc_signature(spec, genome.as_ref()))
            })
            .collect()
    })
}

fn scan_one(spec: &KmerSpec, seq: &[u8], out: &mut FxHashSet<u64>) {
    let prefix = spec.prefix();
    let prefix_len = prefix.len();
    let k = spec.k();
    let total = prefix_len + k as usize;
    if seq.len() < total {
        return;
    }

    // Forward strand: match `prefix` literally (case-insensitively), then
    // encode the k bytes that follow.
    for p in 0..=seq.len() - total {
        if prefix_matches(&seq[p..p + prefix_len], prefix) {
            let suffix = &seq[p + prefix_len..p + prefix_len + k as usize];
            if let Ok(idx) = kmer::encode(suffix, k) {
                out.insert(idx);
            }
        }
    }

    // Reverse strand: match the prefix's reverse complement, then encode
    // the k bytes immediately before the match using `encode_revcomp` so
    // the result lands in the same coordinate space as the forward strand.
    let revcomp_prefix = kmer::revcomp(prefix);
    if seq.len() < revcomp_prefix.len() + k as usize {
        return;
    }
    for p in 0..=seq.len() - revcomp_prefix.len() {
        if p < k as usize {
            continue;
        }
        if prefix_matches(&seq[p..p + revcomp_prefix.len()], &revcomp_prefix) {
            let upstream = &seq[p - k as usize..p];
            if let Ok(idx) = kmer::encode_revcomp(upstream, k) {
                out.insert(idx);
            }
        }
    }
}

#[inline]
fn prefix_matches(window: &[u8], prefix: &[u8]) -> bool {
    window.len() == prefix.len()
        && window
            .iter()
            .zip(prefix)
            .all(|(&a, &b)| a.to_ascii_uppercase() == b)
}
