//! Explicit worker-count thread pool for the signature builder and Jaccard
//! engine.
//!
//! The teacher's parallel fan-out (`run.rs`) rides on rayon's implicit
//! global pool. Per the design notes this crate replaces that with a value
//! the caller constructs once and passes explicitly, so tests and multiple
//! in-process callers don't fight over global thread-pool configuration.

use crate::error::GambitError;

/// A reusable rayon thread pool sized to a caller-chosen worker count.
pub struct WorkerPool {
    inner: rayon::ThreadPool,
}

impl WorkerPool {
    /// Builds a pool with `cores` worker threads. `cores == 0` is treated as
    /// "use all available hardware threads" (rayon's own default).
    ///
    /// # Errors
    ///
    /// Returns `GambitError::Io` if the underlying OS thread spawn fails.
    pub fn new(cores: usize) -> Result<Self, GambitError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if cores > 0 {
            builder = builder.num_threads(cores);
        }
        let inner = builder
            .build()
            .map_err(|e| GambitError::io(std::io::Error::other(e), "worker pool"))?;
        Ok(Self { inner })
    }

    /// Runs `f` with this pool installed as the active rayon pool for the
    /// duration of the call.
    pub fn install<R>(&self, f: impl FnOnce() -> R + Send) -> R
    where
        R: Send,
    {
        self.inner.install(f)
    }

    /// Number of worker threads in this pool.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.inner.current_num_threads()
    }
}
