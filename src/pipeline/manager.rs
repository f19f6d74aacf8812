use super::compressor::FileCompressor;
use super::filter::CandidateFile;
use super::outcome::CompressionOutcome;
use crate::error::{CompressError, SetupError};
use crate::logging::Logger;
use crate::parallel::{PoolConfiguration, TaskError, WorkerPool};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Sizes a worker pool for a batch of files and drives it to completion
pub struct PoolManager {
    available_parallelism: usize,
    max_workers: usize,
    logger: Logger,
}

impl PoolManager {
    pub fn new(available_parallelism: usize, max_workers: usize, logger: Logger) -> Self {
        Self {
            available_parallelism,
            max_workers,
            logger,
        }
    }

    pub fn configuration(&self, work_items: usize) -> PoolConfiguration {
        PoolConfiguration::compute(self.available_parallelism, self.max_workers, work_items)
    }

    /// Compress every candidate, one outcome per candidate
    ///
    /// Outcomes come back in candidate order. The pool is torn down before
    /// returning, including when a task panicked.
    pub fn run<C: FileCompressor>(
        &self,
        candidates: Vec<CandidateFile>,
        compressor: Arc<C>,
    ) -> Result<Vec<CompressionOutcome>, SetupError> {
        let pool_config = self.configuration(candidates.len());
        if pool_config.size == 0 {
            return Ok(Vec::new());
        }

        self.logger
            .debug(format_args!("Initialize pool size: {}", pool_config.size));
        let mut pool = WorkerPool::new(pool_config.size)?;

        let total = candidates.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let compressor = compressor.clone();
                let completed = completed.clone();
                let logger = self.logger;
                let path = candidate.path.clone();
                let handle = pool.submit(move || {
                    let outcome = compressor.compress(&candidate.path);
                    let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    logger.debug(format_args!("Progress: {current}/{total} files"));
                    outcome
                });
                (path, handle)
            })
            .collect();

        // Single join point: every handle is populated after this returns
        pool.join();

        let algorithms = compressor.algorithms();
        let outcomes = handles
            .into_iter()
            .map(|(path, handle)| match handle.wait() {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.logger.error(format_args!(
                        "Worker failed while compressing {}: {err}",
                        path.display()
                    ));
                    let message = match err {
                        TaskError::Panicked(message) => message,
                        other => other.to_string(),
                    };
                    CompressionOutcome::failed_all(path, &algorithms, || {
                        CompressError::Panicked(message.clone())
                    })
                }
            })
            .collect();

        pool.shutdown();
        Ok(outcomes)
    }
}
