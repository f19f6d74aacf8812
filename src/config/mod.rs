//! Configuration management for precompress
//!
//! Settings are layered with figment (see [`PrecompressConfig`]) and
//! deserialized into [`Settings`]. Validation into a runnable request happens
//! in [`crate::request`].

use crate::logging::LogLevel;
use crate::request::{BrotliOptions, GzipOptions};
use serde::{Deserialize, Serialize};

pub mod core;
pub mod smart_load;

pub use self::core::PrecompressConfig;

/// Raw `bool | options` setting as it appears in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Enabled(bool),
    Options(T),
}

/// Merged configuration, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pattern of files to compress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,

    /// Minimum level of log messages
    pub log_level: LogLevel,

    /// `true`, `false`, or `{ level = 0..9 }`
    pub gzip: Toggle<GzipOptions>,

    /// `true`, `false`, or `{ quality = 0..11, window = 10..24 }`
    pub brotli: Toggle<BrotliOptions>,

    pub zstd: bool,

    /// Upper bound on parallel workers (0 = number of CPUs)
    pub max_workers: usize,

    /// Per-file deadline in seconds (0 = none)
    pub file_timeout_secs: u64,

    /// Treat files with no known content type as compressible
    pub unknown_is_compressible: bool,

    /// Stream buffer size in bytes
    pub buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            glob: None,
            log_level: LogLevel::Info,
            gzip: Toggle::Enabled(true),
            brotli: Toggle::Enabled(true),
            zstd: false,
            max_workers: 0,
            file_timeout_secs: 0,
            unknown_is_compressible: false,
            buffer_size: 64 * 1024,
        }
    }
}
