use super::outcome::{CompressionOutcome, FileStatus};
use crate::logging::Logger;
use crate::request::Algorithm;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Byte totals for one algorithm across the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlgorithmTotals {
    pub files: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl AlgorithmTotals {
    /// Output size as a fraction of input size, `None` when nothing was read
    pub fn compression_ratio(&self) -> Option<f64> {
        (self.bytes_read > 0).then(|| self.bytes_written as f64 / self.bytes_read as f64)
    }
}

/// One failed algorithm for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub algorithm: Algorithm,
    pub message: String,
}

/// Aggregated result of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub files_found: usize,
    pub files_filtered_out: usize,
    pub files_processed: usize,
    pub files_succeeded: usize,
    pub files_partially_failed: usize,
    pub files_failed: usize,
    pub pool_size: usize,
    pub per_algorithm: BTreeMap<Algorithm, AlgorithmTotals>,
    pub failures: Vec<FailureRecord>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Summary of a run that had nothing to compress
    pub fn empty(files_found: usize, files_filtered_out: usize, elapsed: Duration) -> Self {
        Self {
            files_found,
            files_filtered_out,
            files_processed: 0,
            files_succeeded: 0,
            files_partially_failed: 0,
            files_failed: 0,
            pool_size: 0,
            per_algorithm: BTreeMap::new(),
            failures: Vec::new(),
            elapsed,
        }
    }

    pub fn from_outcomes(
        files_found: usize,
        files_filtered_out: usize,
        pool_size: usize,
        mut outcomes: Vec<CompressionOutcome>,
        elapsed: Duration,
    ) -> Self {
        // Completion order varies between runs; the summary must not
        outcomes.sort_by(|a, b| a.source.cmp(&b.source));

        let mut summary = Self::empty(files_found, files_filtered_out, elapsed);
        summary.pool_size = pool_size;
        summary.files_processed = outcomes.len();

        for outcome in &outcomes {
            match outcome.status() {
                FileStatus::Succeeded => summary.files_succeeded += 1,
                FileStatus::PartiallyFailed => summary.files_partially_failed += 1,
                FileStatus::Failed => summary.files_failed += 1,
            }

            for (algorithm, result) in &outcome.results {
                match result {
                    Ok(success) => {
                        let totals = summary.per_algorithm.entry(*algorithm).or_default();
                        totals.files += 1;
                        totals.bytes_read += success.bytes_read;
                        totals.bytes_written += success.bytes_written;
                    }
                    Err(err) => summary.failures.push(FailureRecord {
                        path: outcome.source.clone(),
                        algorithm: *algorithm,
                        message: err.to_string(),
                    }),
                }
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 0 when every file produced at least one artifact, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.files_failed > 0 { 1 } else { 0 }
    }

    /// Write the summary through the logger
    pub fn report(&self, logger: &Logger) {
        logger.info(format_args!(
            "Summary: {} found, {} filtered out, {} processed ({} succeeded, {} partially failed, {} failed)",
            self.files_found,
            self.files_filtered_out,
            self.files_processed,
            self.files_succeeded,
            self.files_partially_failed,
            self.files_failed,
        ));

        for (algorithm, totals) in &self.per_algorithm {
            let ratio = totals
                .compression_ratio()
                .map(|ratio| format!("{:.1}%", ratio * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            logger.info(format_args!(
                "  {algorithm}: {} files, {} -> {} bytes ({ratio})",
                totals.files, totals.bytes_read, totals.bytes_written
            ));
        }

        for failure in &self.failures {
            logger.error(format_args!(
                "  {} [{}]: {}",
                failure.path.display(),
                failure.algorithm,
                failure.message
            ));
        }

        logger.info(format_args!(
            "Total compression time: {:.3} seconds",
            self.elapsed.as_secs_f64()
        ));
    }
}
