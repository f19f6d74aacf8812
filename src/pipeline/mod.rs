//! Compression pipeline
//!
//! ```text
//! glob ──► enumerate ──► classify/filter ──► PoolManager ──► RunSummary
//!                                              │
//!                              one StreamCompressor call per file,
//!                              one scoped thread per algorithm
//! ```
//!
//! [`Pipeline`] owns the sequence. Per-file and per-algorithm failures are
//! carried as data in [`CompressionOutcome`] and [`RunSummary`]; only setup
//! problems surface as [`SetupError`](crate::error::SetupError).

pub mod compressor;
pub mod filter;
pub mod manager;
pub mod orchestrator;
pub mod outcome;
pub mod summary;

pub use compressor::{FileCompressor, StreamCompressor, output_path};
pub use filter::{CandidateFile, CompressibilityFilter, is_compressible_type};
pub use manager::PoolManager;
pub use orchestrator::Pipeline;
pub use outcome::{AlgorithmResult, AlgorithmSuccess, CompressionOutcome, FileStatus};
pub use summary::{AlgorithmTotals, FailureRecord, RunSummary};
