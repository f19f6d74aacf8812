use crate::error::CompressError;
use crate::request::Algorithm;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// A finished artifact for one algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmSuccess {
    pub output: PathBuf,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

pub type AlgorithmResult = Result<AlgorithmSuccess, CompressError>;

/// How a file fared across its algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Succeeded,
    PartiallyFailed,
    Failed,
}

/// Per-file record with exactly one result per enabled algorithm
#[derive(Debug)]
pub struct CompressionOutcome {
    pub source: PathBuf,
    pub results: BTreeMap<Algorithm, AlgorithmResult>,
}

impl CompressionOutcome {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            results: BTreeMap::new(),
        }
    }

    /// Outcome where every algorithm failed for the same reason
    pub fn failed_all(source: PathBuf, algorithms: &[Algorithm], reason: impl Fn() -> CompressError) -> Self {
        let results = algorithms
            .iter()
            .map(|algorithm| (*algorithm, Err(reason())))
            .collect();
        Self { source, results }
    }

    pub fn status(&self) -> FileStatus {
        let failures = self.results.values().filter(|r| r.is_err()).count();
        if failures == 0 {
            FileStatus::Succeeded
        } else if failures == self.results.len() {
            FileStatus::Failed
        } else {
            FileStatus::PartiallyFailed
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.results
            .values()
            .filter_map(|r| r.as_ref().ok())
            .map(|s| s.bytes_written)
            .sum()
    }

    /// Human readable single-line description
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .results
            .iter()
            .map(|(algorithm, result)| match result {
                Ok(success) => format!("{algorithm} {} bytes", success.bytes_written),
                Err(err) => format!("{algorithm} failed ({err})"),
            })
            .collect();
        format!("{}: {}", self.source.display(), parts.join(", "))
    }
}
