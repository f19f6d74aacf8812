//! Generic parallel execution framework
//!
//! This module owns system resource management for a run: how many worker
//! threads to start, how work reaches them, and how they are torn down.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Resource Calculation**: Caps the pool by user configuration and by the amount of work
//! - **Execution**: Runs submitted tasks on an eager, fixed-size pool fed by crossbeam channels
//! - **Lifecycle**: Joins every worker on shutdown or drop, on every exit path
//!
//! ## What This Module Does NOT Do:
//! - **Domain Logic**: Does not know about files, content types or codecs
//! - **Result Interpretation**: A panicking task is reported as [`TaskError::Panicked`];
//!   turning that into a domain outcome is the caller's job
//!
//! # Lifecycle
//!
//! ```text
//! create ──▶ submit × N ──▶ join (once) ──▶ shutdown / drop
//!   │           │               │                │
//!   │           │               │                └─ queue closed, threads joined
//!   │           │               └─ blocks until every task has finished
//!   │           └─ tasks queue until a worker is free
//!   └─ all workers spawned up front
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use precompress::parallel::{PoolConfiguration, WorkerPool};
//!
//! let config = PoolConfiguration::compute(8, 0, 3);
//! assert_eq!(config.size, 3);
//!
//! let mut pool = WorkerPool::new(config.size).unwrap();
//! let handles: Vec<_> = (0..3).map(|i| pool.submit(move || i * 10)).collect();
//! pool.join();
//! let total: i32 = handles.into_iter().map(|h| h.wait().unwrap()).sum();
//! assert_eq!(total, 30);
//! pool.shutdown();
//! ```

pub mod cancel;
pub mod pool;

// Re-export main types for easier access
pub use cancel::CancellationFlag;
pub use pool::{PoolConfiguration, TaskError, TaskHandle, WorkerPool};
