//! Leveled logging capability
//!
//! Components never reach for a global logger. They receive a [`Logger`] at
//! construction, which filters by threshold and forwards to `tracing`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message priority, lowest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Whether a message at `message_level` passes a threshold of `self`
    pub fn permits(self, message_level: LogLevel) -> bool {
        message_level >= self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging handle injected into pipeline components
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    threshold: LogLevel,
}

impl Logger {
    pub fn new(threshold: LogLevel) -> Self {
        Self { threshold }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.threshold.permits(level)
    }

    pub fn debug(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!("{message}");
        }
    }

    pub fn info(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Info) {
            tracing::info!("{message}");
        }
    }

    pub fn warn(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!("{message}");
        }
    }

    pub fn error(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Error) {
            tracing::error!("{message}");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

/// Install the process-wide tracing subscriber
///
/// `RUST_LOG` wins when set. Otherwise the filter follows `level`, keeping the
/// directory walker crates quiet unless debugging.
pub fn init(level: LogLevel) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        LogLevel::Debug => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
        LogLevel::Info => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
        LogLevel::Warn => tracing_subscriber::EnvFilter::new("warn"),
        LogLevel::Error => tracing_subscriber::EnvFilter::new("error"),
    });

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
