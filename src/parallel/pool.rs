//! Rayon thread pool configuration for the search.
//!
//! Slot-combination generation and the parallel search driver both run inside
//! [WorkerPool::install], either on the global Rayon pool or on a dedicated one.

use rayon::ThreadPoolBuilder;
use tracing::warn;

/// Configures how many worker threads the search uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a thread pool with this worker count. If [workers](WorkerPool::workers) is 0,
    /// uses the global Rayon pool (all cores). Otherwise builds a temporary pool with that many threads,
    /// falling back to the global pool if it cannot be built.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                warn!(workers = self.workers, error = %err, "falling back to the global pool");
                f()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedicated_pool_uses_the_requested_threads() {
        let threads = WorkerPool::with_workers(3).install(rayon::current_num_threads);
        assert_eq!(threads, 3);
    }

    #[test]
    fn default_pool_runs_inline() {
        assert_eq!(WorkerPool::default().install(|| 7), 7);
    }
}
