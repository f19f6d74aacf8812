use crate::config::PrecompressConfig;
use crate::logging::{self, LogLevel, Logger};
use crate::pipeline::Pipeline;
use crate::request::CompressionRequest;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Files to compress, e.g. "dist/**/*.{html,css,js}" (falls back to `glob` in config)
    #[arg(value_name = "GLOB")]
    pub glob: Option<String>,

    /// Gzip compression level (0-9)
    #[arg(long, value_name = "N", conflicts_with = "no_gzip")]
    pub gzip_level: Option<u32>,

    /// Do not produce .gz files
    #[arg(long)]
    pub no_gzip: bool,

    /// Brotli quality (0-11)
    #[arg(long, value_name = "N", conflicts_with = "no_brotli")]
    pub brotli_quality: Option<u32>,

    /// Brotli window size in bits (10-24)
    #[arg(long, value_name = "N", conflicts_with = "no_brotli")]
    pub brotli_window: Option<u32>,

    /// Do not produce .br files
    #[arg(long)]
    pub no_brotli: bool,

    /// Also produce .zst files
    #[arg(long, conflicts_with = "no_zstd")]
    pub zstd: bool,

    /// Do not produce .zst files
    #[arg(long)]
    pub no_zstd: bool,

    /// Maximum number of parallel workers (0 = number of CPUs)
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Abort a file that takes longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Minimum level of log messages
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Compress files whose content type cannot be determined
    #[arg(long)]
    pub unknown_compressible: bool,
}

/// Flags that were actually given, in configuration shape
#[derive(Debug, Default, Serialize)]
struct RunOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    glob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gzip: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brotli: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    zstd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unknown_is_compressible: Option<bool>,
}

impl RunArgs {
    fn overrides(&self, verbosity: Option<LogLevel>) -> RunOverrides {
        let gzip = if self.no_gzip {
            Some(Value::Bool(false))
        } else {
            self.gzip_level.map(|level| json!({ "level": level }))
        };

        let brotli = if self.no_brotli {
            Some(Value::Bool(false))
        } else {
            let mut options = Map::new();
            if let Some(quality) = self.brotli_quality {
                options.insert("quality".to_string(), json!(quality));
            }
            if let Some(window) = self.brotli_window {
                options.insert("window".to_string(), json!(window));
            }
            (!options.is_empty()).then_some(Value::Object(options))
        };

        let zstd = match (self.zstd, self.no_zstd) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        RunOverrides {
            glob: self.glob.clone(),
            log_level: self.log_level.or(verbosity),
            gzip,
            brotli,
            zstd,
            max_workers: self.jobs,
            file_timeout_secs: self.timeout,
            unknown_is_compressible: self.unknown_compressible.then_some(true),
        }
    }
}

pub async fn execute(args: RunArgs, custom_config: Option<&str>, verbosity: Option<LogLevel>) -> Result<u8> {
    let config = PrecompressConfig::load_with(custom_config, Some(args.overrides(verbosity)))
        .context("Failed to load configuration")?;
    let settings = config.settings().context("Failed to parse configuration")?;
    let request = CompressionRequest::from_settings(&settings).context("Invalid configuration")?;

    logging::init(request.log_level);
    let logger = Logger::new(request.log_level);

    let pipeline = Pipeline::new(Arc::new(request), logger);
    let cancellation = pipeline.cancellation();
    let mut task = tokio::task::spawn_blocking(move || pipeline.run());

    let joined = tokio::select! {
        joined = &mut task => joined,
        Ok(()) = tokio::signal::ctrl_c() => {
            logger.warn("Interrupted, cancelling files in progress...");
            cancellation.cancel();
            // The pool still drains and shuts down before the task returns
            task.await
        }
    };

    let summary = joined
        .context("Compression task failed")?
        .context("Compression run aborted")?;
    let exit_code = summary.exit_code();
    if exit_code == 0 && summary.has_failures() {
        logger.warn(format_args!(
            "{} file(s) only partially compressed, see failures above",
            summary.files_partially_failed
        ));
    }
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(args: RunArgs) -> Value {
        serde_json::to_value(args.overrides(None)).unwrap()
    }

    #[test]
    fn test_no_flags_override_nothing() {
        assert_eq!(overrides(RunArgs::default()), json!({}));
    }

    #[test]
    fn test_algorithm_flags() {
        let value = overrides(RunArgs {
            glob: Some("dist/**/*.js".to_string()),
            gzip_level: Some(9),
            brotli_quality: Some(5),
            zstd: true,
            ..RunArgs::default()
        });
        assert_eq!(
            value,
            json!({
                "glob": "dist/**/*.js",
                "gzip": { "level": 9 },
                "brotli": { "quality": 5 },
                "zstd": true,
            })
        );
    }

    #[test]
    fn test_disable_flags() {
        let value = overrides(RunArgs {
            no_gzip: true,
            no_brotli: true,
            no_zstd: true,
            ..RunArgs::default()
        });
        assert_eq!(value, json!({ "gzip": false, "brotli": false, "zstd": false }));
    }

    #[test]
    fn test_explicit_log_level_beats_verbosity() {
        let args = RunArgs {
            log_level: Some(LogLevel::Warn),
            ..RunArgs::default()
        };
        assert_eq!(args.overrides(Some(LogLevel::Debug)).log_level, Some(LogLevel::Warn));
        assert_eq!(
            RunArgs::default().overrides(Some(LogLevel::Error)).log_level,
            Some(LogLevel::Error)
        );
    }

    #[test]
    fn test_overrides_layer_over_defaults() {
        let config = PrecompressConfig::load_with(
            None,
            Some(
                RunArgs {
                    glob: Some("*.css".to_string()),
                    gzip_level: Some(1),
                    jobs: Some(3),
                    timeout: Some(10),
                    ..RunArgs::default()
                }
                .overrides(None),
            ),
        )
        .unwrap();
        let request = CompressionRequest::from_settings(&config.settings().unwrap()).unwrap();

        assert_eq!(request.glob, "*.css");
        assert_eq!(request.gzip.options().map(|o| o.level), Some(1));
        assert!(request.brotli.is_enabled());
        assert_eq!(request.max_workers, 3);
        assert_eq!(request.file_timeout, Some(std::time::Duration::from_secs(10)));
    }
}
