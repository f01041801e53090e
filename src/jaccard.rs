//! Sparse Jaccard engine.
//!
//! Computes the Jaccard distance between two sorted, deduplicated integer
//! arrays by a linear merge, and fans the one-vs-many case out across a
//! [`WorkerPool`](crate::concurrency::WorkerPool).

use rayon::prelude::*;

use crate::concurrency::WorkerPool;
use crate::error::GambitError;
use crate::progress::CancellationToken;
use crate::store::SignatureContainer;

/// Computes `1 - |A ∩ B| / |A ∪ B|` for two strictly sorted slices.
///
/// Walks two cursors over `a` and `b`, incrementing a union counter `u` on
/// every step and advancing whichever cursor points at the smaller value
/// (advancing both on a tie, which is what avoids double-counting shared
/// elements in the union). Once one side is exhausted, the remaining length
/// of the other is added to `u`. The result is always in `[0.0, 1.0]`,
/// symmetric, `0.0` for `a == b` (including empty-vs-empty), and `1.0` for
/// empty-vs-nonempty.
#[must_use]
pub fn jaccard_distance(a: &[u64], b: &[u64]) -> f32 {
    let (mut i, mut j) = (0usize, 0usize);
    let mut u: u64 = 0;

    while i < a.len() && j < b.len() {
        u += 1;
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    u += (a.len() - i) as u64;
    u += (b.len() - j) as u64;

    if u == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let distance = (2 * u - a.len() as u64 - b.len() as u64) as f32 / u as f32;
    distance
}

/// Computes `jaccard_distance(query, refs.get(i))` for every `i` in
/// `refs`, in parallel, returning a dense `f32` vector indexed the same way
/// as `refs`.
///
/// Each pairwise computation writes exactly one output slot and the token is
/// polled once per reference, so a cancelled call can stop early without
/// corrupting already-written slots; on cancellation this returns
/// `GambitError::Cancelled` and discards the partial vector.
pub fn jaccard_distances(
    query: &[u64],
    refs: &dyn SignatureContainer,
    pool: &WorkerPool,
    token: &CancellationToken,
) -> Result<Vec<f32>, GambitError> {
    pool.install(|| {
        (0..refs.len())
            .into_par_iter()
            .map(|i| {
                if token.is_cancelled() {
                    return Err(GambitError::Cancelled);
                }
                Ok(jaccard_distance(query, &refs.get(i)))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_union_and_intersection() {
        let a = [0u64, 3];
        let b = [1u64, 2, 3];
        assert!((jaccard_distance(&a, &b) - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn s5_empty_vs_empty_is_zero() {
        assert_eq!(jaccard_distance(&[], &[]), 0.0);
    }

    #[test]
    fn s5_empty_vs_nonempty_is_one() {
        assert_eq!(jaccard_distance(&[], &[0]), 1.0);
    }

    #[test]
    fn identity_is_zero() {
        let a = [1u64, 5, 9, 100];
        assert_eq!(jaccard_distance(&a, &a), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = [1u64, 2, 3, 10];
        let b = [2u64, 3, 4];
        assert_eq!(jaccard_distance(&a, &b), jaccard_distance(&b, &a));
    }

    #[test]
    fn always_in_unit_interval() {
        let cases: [(&[u64], &[u64]); 4] = [
            (&[], &[]),
            (&[1], &[]),
            (&[1, 2, 3], &[1, 2, 3]),
            (&[1, 2, 3], &[4, 5, 6]),
        ];
        for (a, b) in cases {
            let d = jaccard_distance(a, b);
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn disjoint_sets_distance_is_one() {
        let a = [1u64, 2, 3];
        let b = [4u64, 5, 6];
        assert_eq!(jaccard_distance(&a, &b), 1.0);
    }

    struct InMemoryRefs(Vec<Vec<u64>>);

    impl SignatureContainer for InMemoryRefs {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn get(&self, i: usize) -> std::borrow::Cow<'_, [u64]> {
            std::borrow::Cow::Borrowed(&self.0[i])
        }
    }

    #[test]
    fn jaccard_distances_matches_pairwise() {
        let refs = InMemoryRefs(vec![vec![0, 3], vec![1, 2, 3], vec![]]);
        let query = [0u64, 1, 2];
        let pool = WorkerPool::new(2).unwrap();
        let token = CancellationToken::new();
        let distances = jaccard_distances(&query, &refs, &pool, &token).unwrap();
        for (i, &d) in distances.iter().enumerate() {
            assert_eq!(d, jaccard_distance(&query, &refs.0[i]));
        }
    }

    #[test]
    fn jaccard_distances_respects_cancellation() {
        let refs = InMemoryRefs(vec![vec![0]; 1000]);
        let query = [0u64];
        let pool = WorkerPool::new(2).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let result = jaccard_distances(&query, &refs, &pool, &token);
        assert!(matches!(result, Err(GambitError::Cancelled)));
    }
}
