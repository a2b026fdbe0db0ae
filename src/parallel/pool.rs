//! Rayon thread pool configuration for sweep workloads.
//!
//! Use [WorkerPool::install] to run a sweep with a fixed number of threads,
//! or rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

use crate::error::{Result, SimError};

/// Configures how many worker threads are used for parallel sweeps.
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

    /// Run a closure with this worker count. With 0 workers the global pool is
    /// used; otherwise a temporary pool is built for the call.
    pub fn install<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return Ok(f());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|err| SimError::InvalidConfig(format!("thread pool: {err}")))?;
        Ok(pool.install(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pool_runs_on_requested_thread_count() {
        let threads = WorkerPool::with_workers(2)
            .install(rayon::current_num_threads)
            .unwrap();
        assert_eq!(threads, 2);
    }

    #[test]
    fn default_pool_runs_inline() {
        assert_eq!(WorkerPool::default().install(|| 41 + 1).unwrap(), 42);
    }
}
