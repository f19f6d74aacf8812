//! Immutable description of one compression run
//!
//! Raw `bool | options` settings are resolved here, once, into
//! [`AlgorithmSpec`] values. Nothing downstream looks at the raw shape again.

use crate::config::{Settings, Toggle};
use crate::error::SetupError;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Supported compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Gzip,
    Brotli,
    Zstd,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Gzip, Algorithm::Brotli, Algorithm::Zstd];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Gzip => "gzip",
            Algorithm::Brotli => "brotli",
            Algorithm::Zstd => "zstd",
        }
    }

    /// Canonical file suffix, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Algorithm::Gzip => "gz",
            Algorithm::Brotli => "br",
            Algorithm::Zstd => "zst",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gzip tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GzipOptions {
    /// Compression level, 0 (store) to 9 (best)
    pub level: u32,
}

impl Default for GzipOptions {
    fn default() -> Self {
        Self { level: 6 }
    }
}

/// Brotli tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrotliOptions {
    /// Quality, 0 to 11
    pub quality: u32,
    /// Base-2 log of the sliding window size, 10 to 24
    pub window: u32,
}

impl Default for BrotliOptions {
    fn default() -> Self {
        Self {
            quality: 11,
            window: 22,
        }
    }
}

/// Whether and how an algorithm takes part in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmSpec<O> {
    Disabled,
    EnabledDefault,
    EnabledWithOptions(O),
}

impl<O: Copy + Default> AlgorithmSpec<O> {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AlgorithmSpec::Disabled)
    }

    /// Effective options for an enabled algorithm
    pub fn options(&self) -> Option<O> {
        match self {
            AlgorithmSpec::Disabled => None,
            AlgorithmSpec::EnabledDefault => Some(O::default()),
            AlgorithmSpec::EnabledWithOptions(options) => Some(*options),
        }
    }
}

impl<O> From<Toggle<O>> for AlgorithmSpec<O> {
    fn from(toggle: Toggle<O>) -> Self {
        match toggle {
            Toggle::Enabled(false) => AlgorithmSpec::Disabled,
            Toggle::Enabled(true) => AlgorithmSpec::EnabledDefault,
            Toggle::Options(options) => AlgorithmSpec::EnabledWithOptions(options),
        }
    }
}

/// Everything a run needs, validated up front
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub glob: String,
    pub gzip: AlgorithmSpec<GzipOptions>,
    pub brotli: AlgorithmSpec<BrotliOptions>,
    /// zstd has no tunables, it always runs at the library default level
    pub zstd: bool,
    pub log_level: LogLevel,
    /// Upper bound on pool size, 0 means bounded only by CPUs and work
    pub max_workers: usize,
    /// Per-file deadline covering all of that file's algorithms
    pub file_timeout: Option<Duration>,
    pub unknown_is_compressible: bool,
    /// Read and write buffer capacity per stream
    pub buffer_size: usize,
}

impl CompressionRequest {
    /// Build a request from merged settings, rejecting anything unusable
    pub fn from_settings(settings: &Settings) -> Result<Self, SetupError> {
        let glob = settings
            .glob
            .as_deref()
            .map(str::trim)
            .filter(|glob| !glob.is_empty())
            .ok_or_else(|| SetupError::InvalidConfig("a glob pattern is required".to_string()))?
            .to_string();

        let gzip = AlgorithmSpec::from(settings.gzip);
        if let Some(options) = gzip.options() {
            if options.level > 9 {
                return Err(SetupError::InvalidConfig(format!(
                    "gzip level must be between 0 and 9, got {}",
                    options.level
                )));
            }
        }

        let brotli = AlgorithmSpec::from(settings.brotli);
        if let Some(options) = brotli.options() {
            if options.quality > 11 {
                return Err(SetupError::InvalidConfig(format!(
                    "brotli quality must be between 0 and 11, got {}",
                    options.quality
                )));
            }
            if !(10..=24).contains(&options.window) {
                return Err(SetupError::InvalidConfig(format!(
                    "brotli window must be between 10 and 24, got {}",
                    options.window
                )));
            }
        }

        if settings.buffer_size == 0 {
            return Err(SetupError::InvalidConfig(
                "buffer_size must be greater than zero".to_string(),
            ));
        }

        let request = Self {
            glob,
            gzip,
            brotli,
            zstd: settings.zstd,
            log_level: settings.log_level,
            max_workers: settings.max_workers,
            file_timeout: (settings.file_timeout_secs > 0)
                .then(|| Duration::from_secs(settings.file_timeout_secs)),
            unknown_is_compressible: settings.unknown_is_compressible,
            buffer_size: settings.buffer_size,
        };

        if request.enabled_algorithms().is_empty() {
            return Err(SetupError::InvalidConfig(
                "at least one of gzip, brotli or zstd must be enabled".to_string(),
            ));
        }

        Ok(request)
    }

    pub fn is_enabled(&self, algorithm: Algorithm) -> bool {
        match algorithm {
            Algorithm::Gzip => self.gzip.is_enabled(),
            Algorithm::Brotli => self.brotli.is_enabled(),
            Algorithm::Zstd => self.zstd,
        }
    }

    /// Enabled algorithms in stable order
    pub fn enabled_algorithms(&self) -> Vec<Algorithm> {
        Algorithm::ALL
            .into_iter()
            .filter(|algorithm| self.is_enabled(*algorithm))
            .collect()
    }

    /// One-line description used in run logs
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(options) = self.gzip.options() {
            parts.push(format!("gzip(level={})", options.level));
        }
        if let Some(options) = self.brotli.options() {
            parts.push(format!(
                "brotli(quality={}, window={})",
                options.quality, options.window
            ));
        }
        if self.zstd {
            parts.push(format!("zstd(level={})", zstd::DEFAULT_COMPRESSION_LEVEL));
        }
        parts.join(", ")
    }
}
