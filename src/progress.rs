//! Progress tracking and cancellation for long-running signature operations.
//!
//! `ProgressTracker` gives a caller building a large signature store (many
//! genome assemblies, each scanned in parallel) a thread-safe place to record
//! how much work has been done so far. `CancellationToken` is the
//! complementary control: a shared, pollable flag that lets a caller abort a
//! batch of genomes or reference comparisons already underway.
//!
//! # Example
//!
//! ```
//! use gambit::progress::ProgressTracker;
//!
//! let tracker = ProgressTracker::new();
//! tracker.record_sequence(4_600_000);
//! let progress = tracker.snapshot();
//! assert_eq!(progress.sequences_processed, 1);
//! assert_eq!(progress.bases_processed, 4_600_000);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Progress snapshot for a batch of genomes being scanned into signatures.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    /// Number of genome assemblies processed so far.
    pub sequences_processed: u64,
    /// Total number of bases scanned so far, across all contigs.
    pub bases_processed: u64,
}

/// Thread-safe progress tracker using atomic counters.
///
/// This struct maintains atomic counters that can be safely updated from
/// multiple threads as `calc_signatures_parallel` works through a batch of
/// genomes.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    sequences: AtomicU64,
    bases: AtomicU64,
}

impl ProgressTracker {
    /// Create a new progress tracker with zero counts.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequences: AtomicU64::new(0),
            bases: AtomicU64::new(0),
        }
    }

    /// Record that a sequence has been processed.
    ///
    /// This method is thread-safe and can be called from multiple threads.
    ///
    /// # Arguments
    ///
    /// * `bases` - The number of bases in the processed sequence.
    pub fn record_sequence(&self, bases: u64) {
        self.sequences.fetch_add(1, Ordering::Relaxed);
        self.bases.fetch_add(bases, Ordering::Relaxed);
    }

    /// Get a snapshot of the current progress.
    ///
    /// The returned values represent the state at a point in time and may
    /// change immediately after this call returns.
    pub fn snapshot(&self) -> Progress {
        Progress {
            sequences_processed: self.sequences.load(Ordering::Relaxed),
            bases_processed: self.bases.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.sequences.store(0, Ordering::Relaxed);
        self.bases.store(0, Ordering::Relaxed);
    }
}

/// A shared, pollable cancellation flag.
///
/// Cloning shares the underlying flag (it wraps an `Arc<AtomicBool>`), so a
/// caller can hold one clone to fire cancellation and hand worker threads
/// another clone to poll between units of work — between genomes in
/// `calc_signatures_parallel`, between references in `jaccard_distances`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that starts out not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks this token (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once `cancel` has been called on this token or any of
    /// its clones.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancelling_a_clone_is_visible_on_the_original() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn tracker_starts_at_zero() {
        let tracker = ProgressTracker::new();
        let progress = tracker.snapshot();
        assert_eq!(progress.sequences_processed, 0);
        assert_eq!(progress.bases_processed, 0);
    }

    #[test]
    fn tracker_records_sequence() {
        let tracker = ProgressTracker::new();
        tracker.record_sequence(100);
        tracker.record_sequence(50);

        let progress = tracker.snapshot();
        assert_eq!(progress.sequences_processed, 2);
        assert_eq!(progress.bases_processed, 150);
    }

    #[test]
    fn tracker_reset() {
        let tracker = ProgressTracker::new();
        tracker.record_sequence(100);
        tracker.reset();

        let progress = tracker.snapshot();
        assert_eq!(progress.sequences_processed, 0);
        assert_eq!(progress.bases_processed, 0);
    }
}
