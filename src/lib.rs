//! # precompress - parallel static asset compression
//!
//! precompress finds files matching a glob pattern, keeps the ones whose
//! content type benefits from compression, and writes a compressed sibling
//! for each enabled algorithm:
//!
//! - **gzip** (`.gz`) via `flate2`
//! - **brotli** (`.br`) via `brotli`
//! - **zstd** (`.zst`) via `zstd`
//!
//! Files are spread over a fixed-size pool of worker threads. The algorithms
//! for one file run side by side, each with its own read of the source, so a
//! failure in one codec never touches another.
//!
//! ## Quick Start
//!
//! ```bash
//! # Compress a build directory with the default gzip + brotli
//! precompress run "dist/**/*.{html,css,js,svg}"
//!
//! # Maximum gzip, no brotli, add zstd, at most 4 workers
//! precompress run "public/**/*" --gzip-level 9 --no-brotli --zstd -j 4
//!
//! # Inspect the merged configuration
//! precompress config show
//! ```
//!
//! ## Configuration
//!
//! Settings are layered from built-in defaults, `~/.config/precompress/config.toml`,
//! `./precompress.toml` (or `.json`/`.yaml`), `--config <FILE>`, `PRECOMPRESS_*`
//! environment variables and finally command-line flags:
//!
//! ```toml
//! glob = "dist/**/*"
//! gzip = { level = 9 }
//! brotli = { quality = 11, window = 22 }
//! zstd = true
//! max_workers = 4
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use precompress::config::PrecompressConfig;
//! use precompress::logging::Logger;
//! use precompress::pipeline::Pipeline;
//! use precompress::request::CompressionRequest;
//! use std::sync::Arc;
//!
//! let settings = PrecompressConfig::load()?.settings()?;
//! let request = Arc::new(CompressionRequest::from_settings(&settings)?);
//! let logger = Logger::new(request.log_level);
//!
//! let summary = Pipeline::new(request, logger).run()?;
//! println!("{} files compressed", summary.files_succeeded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod parallel;
pub mod pipeline;
pub mod request;
pub mod shared;
