//! Bounded CPU pool for fuzzy-scoring work
//!
//! Scoring a dataset partition is pure CPU; running it on the cooperative
//! scheduler would stall every worker loop. Jobs hand the closure to a
//! fixed-size rayon pool and suspend on a oneshot until it returns.

use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Fixed-size thread pool for CPU-bound scoring
pub struct ScoringPool {
    pool: rayon::ThreadPool,
}

impl ScoringPool {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("scoring-{}", i))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build scoring pool: {}", e)))?;

        tracing::info!(threads = threads.max(1), "scoring pool ready");
        Ok(Self { pool })
    }

    /// Run `work` on the pool, suspending the caller until it completes
    pub async fn run<F, R>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let _ = tx.send(work());
        });
        rx.await
            .map_err(|_| Error::Internal("scoring pool dropped the result".to_string()))
    }

    /// Number of threads in the pool
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_work_off_the_scheduler() {
        let pool = ScoringPool::new(2).unwrap();
        let result = pool.run(|| (1..=10u32).sum::<u32>()).await.unwrap();
        assert_eq!(result, 55);
        assert_eq!(pool.threads(), 2);
    }

    #[tokio::test]
    async fn test_zero_threads_clamped() {
        let pool = ScoringPool::new(0).unwrap();
        assert_eq!(pool.threads(), 1);
    }
}
