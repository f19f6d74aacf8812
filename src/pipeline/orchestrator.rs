use super::compressor::StreamCompressor;
use super::filter::{CandidateFile, CompressibilityFilter};
use super::manager::PoolManager;
use super::outcome::FileStatus;
use super::summary::RunSummary;
use crate::error::SetupError;
use crate::logging::Logger;
use crate::parallel::CancellationFlag;
use crate::request::CompressionRequest;
use crate::shared::{ContentTypeClassifier, ExtensionClassifier, FileEnumerator, GlobEnumerator};
use std::sync::Arc;
use std::time::Instant;

/// End-to-end run: enumerate, filter, compress in parallel, summarize
pub struct Pipeline {
    request: Arc<CompressionRequest>,
    logger: Logger,
    enumerator: Box<dyn FileEnumerator>,
    classifier: Box<dyn ContentTypeClassifier>,
    available_parallelism: usize,
    cancellation: CancellationFlag,
}

impl Pipeline {
    pub fn new(request: Arc<CompressionRequest>, logger: Logger) -> Self {
        Self {
            request,
            logger,
            enumerator: Box::new(GlobEnumerator::new(".", logger)),
            classifier: Box::new(ExtensionClassifier),
            available_parallelism: num_cpus::get(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_enumerator(mut self, enumerator: impl FileEnumerator + 'static) -> Self {
        self.enumerator = Box::new(enumerator);
        self
    }

    pub fn with_classifier(mut self, classifier: impl ContentTypeClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Override the detected CPU count
    pub fn with_available_parallelism(mut self, available: usize) -> Self {
        self.available_parallelism = available.max(1);
        self
    }

    /// Flag that aborts in-flight files when tripped
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    pub fn request(&self) -> &CompressionRequest {
        &self.request
    }

    /// Run to completion
    ///
    /// Only setup problems are errors. Per-file failures are reported in the
    /// returned summary.
    pub fn run(&self) -> Result<RunSummary, SetupError> {
        let start = Instant::now();
        let logger = self.logger;

        logger.info(format_args!("Searching files with pattern: {}", self.request.glob));
        let files = self.enumerator.enumerate(&self.request.glob)?;
        logger.info(format_args!(
            "Found {} files with the specified pattern.",
            files.len()
        ));

        let filter = CompressibilityFilter::new(self.request.unknown_is_compressible);
        let files_found = files.len();
        let candidates: Vec<CandidateFile> = files
            .into_iter()
            .map(|path| CandidateFile::classify(path, self.classifier.as_ref(), &filter))
            .inspect(|candidate| {
                logger.debug(format_args!(
                    "File: {}, MIME type: {}, Compressible: {}",
                    candidate.path.display(),
                    candidate.content_type.unwrap_or("unknown"),
                    candidate.eligible
                ));
            })
            .filter(|candidate| candidate.eligible)
            .collect();
        let files_filtered_out = files_found - candidates.len();

        if candidates.is_empty() {
            logger.info("No compressible files found, nothing to do.");
            let summary = RunSummary::empty(files_found, files_filtered_out, start.elapsed());
            summary.report(&logger);
            return Ok(summary);
        }

        logger.info(format_args!(
            "Compressing {} compressible files with options: {}",
            candidates.len(),
            self.request.describe()
        ));

        let manager = PoolManager::new(
            self.available_parallelism,
            self.request.max_workers,
            logger,
        );
        logger.debug(format_args!(
            "Number of available CPU cores: {}",
            self.available_parallelism
        ));
        let pool_size = manager.configuration(candidates.len()).size;

        let compressor = Arc::new(StreamCompressor::new(
            self.request.clone(),
            logger,
            self.cancellation.clone(),
        ));
        let outcomes = manager.run(candidates, compressor)?;

        for outcome in &outcomes {
            match outcome.status() {
                FileStatus::Succeeded => logger.info(format_args!("Compressed {}", outcome.describe())),
                FileStatus::PartiallyFailed => {
                    logger.warn(format_args!("Partially compressed {}", outcome.describe()))
                }
                FileStatus::Failed => logger.error(format_args!("Failed {}", outcome.describe())),
            }
        }
        logger.info("All compressible files have been processed");
        if self.cancellation.is_cancelled() {
            logger.warn("Run was cancelled before every file finished");
        }

        let summary = RunSummary::from_outcomes(
            files_found,
            files_filtered_out,
            pool_size,
            outcomes,
            start.elapsed(),
        );
        summary.report(&logger);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::EnumerationError;
    use crate::logging::LogLevel;
    use crate::request::Algorithm;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct FixedEnumerator(Vec<PathBuf>);

    impl FileEnumerator for FixedEnumerator {
        fn enumerate(&self, _pattern: &str) -> Result<Vec<PathBuf>, EnumerationError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenEnumerator;

    impl FileEnumerator for BrokenEnumerator {
        fn enumerate(&self, pattern: &str) -> Result<Vec<PathBuf>, EnumerationError> {
            Err(crate::shared::glob::compile(pattern).unwrap_err())
        }
    }

    fn request(glob: &str, configure: impl FnOnce(&mut Settings)) -> Arc<CompressionRequest> {
        let mut settings = Settings {
            glob: Some(glob.to_string()),
            ..Settings::default()
        };
        configure(&mut settings);
        Arc::new(CompressionRequest::from_settings(&settings).unwrap())
    }

    fn pipeline(request: Arc<CompressionRequest>, dir: &Path) -> Pipeline {
        let logger = Logger::new(LogLevel::Error);
        Pipeline::new(request, logger)
            .with_enumerator(GlobEnumerator::new(dir, logger))
            .with_available_parallelism(4)
    }

    #[test]
    fn test_html_compressed_png_filtered() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.html"), "<html><body>hello</body></html>").unwrap();
        fs::write(temp.path().join("b.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let request = request("*", |s| s.brotli = crate::config::Toggle::Enabled(false));
        let summary = pipeline(request, temp.path()).run().unwrap();

        assert_eq!(summary.files_found, 2);
        assert_eq!(summary.files_filtered_out, 1);
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_succeeded, 1);
        assert_eq!(summary.pool_size, 1);
        assert!(temp.path().join("a.html.gz").exists());
        assert!(!temp.path().join("b.png.gz").exists());
        assert!(!temp.path().join("a.html.br").exists());
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_no_matches_creates_no_pool() {
        let temp = TempDir::new().unwrap();
        let summary = pipeline(request("*.css", |_| {}), temp.path()).run().unwrap();

        assert_eq!(summary.files_found, 0);
        assert_eq!(summary.files_processed, 0);
        assert_eq!(summary.pool_size, 0);
    }

    #[test]
    fn test_only_ineligible_files_is_empty_run() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("photo.jpg"), [0xff, 0xd8]).unwrap();
        fs::write(temp.path().join("notes"), "no extension").unwrap();

        let summary = pipeline(request("*", |_| {}), temp.path()).run().unwrap();
        assert_eq!(summary.files_found, 2);
        assert_eq!(summary.files_filtered_out, 2);
        assert_eq!(summary.pool_size, 0);
        assert!(summary.per_algorithm.is_empty());
    }

    #[test]
    fn test_unknown_policy_admits_extensionless_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("LICENSE"), "permission is hereby granted").unwrap();

        let request = request("*", |s| s.unknown_is_compressible = true);
        let summary = pipeline(request, temp.path()).run().unwrap();
        assert_eq!(summary.files_processed, 1);
        assert!(temp.path().join("LICENSE.gz").exists());
        assert!(temp.path().join("LICENSE.br").exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.js"), "console.log('hi');".repeat(50)).unwrap();
        fs::write(temp.path().join("site.css"), "body { margin: 0 }".repeat(50)).unwrap();

        let request = request("*", |_| {});
        let first = pipeline(request.clone(), temp.path()).run().unwrap();
        let second = pipeline(request, temp.path()).run().unwrap();

        // Artifacts from the first run are found but never recompressed
        assert_eq!(first.files_processed, 2);
        assert_eq!(second.files_processed, 2);
        assert_eq!(second.files_found, 6);
        assert_eq!(first.per_algorithm, second.per_algorithm);
        assert_eq!(first.failures, second.failures);
    }

    #[test]
    fn test_missing_file_fails_only_itself() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present.txt");
        fs::write(&present, "still here").unwrap();
        let missing = temp.path().join("missing.txt");

        let logger = Logger::new(LogLevel::Error);
        let summary = Pipeline::new(request("*.txt", |_| {}), logger)
            .with_enumerator(FixedEnumerator(vec![missing, present.clone()]))
            .run()
            .unwrap();

        assert_eq!(summary.files_succeeded, 1);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.failures.len(), 2);
        assert!(summary.failures.iter().all(|f| f.path.ends_with("missing.txt")));
        assert!(present.with_extension("txt.gz").exists());
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_cancelled_run_still_reports_every_file() {
        let temp = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(temp.path().join(name), "data").unwrap();
        }

        let pipeline = pipeline(request("*.txt", |_| {}), temp.path());
        pipeline.cancellation().cancel();
        let summary = pipeline.run().unwrap();

        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_failed, 3);
        assert!(summary.failures.iter().all(|f| f.message == "run cancelled"));
        assert!(!temp.path().join("a.txt.gz").exists());
    }

    #[test]
    fn test_enumeration_error_is_setup_error() {
        let logger = Logger::new(LogLevel::Error);
        let result = Pipeline::new(request("[", |_| {}), logger)
            .with_enumerator(BrokenEnumerator)
            .run();
        assert!(matches!(result, Err(SetupError::Enumeration(_))));
    }

    #[test]
    fn test_zstd_only_run() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("data.json"), r#"{"key": "value"}"#).unwrap();

        let request = request("*.json", |s| {
            s.gzip = crate::config::Toggle::Enabled(false);
            s.brotli = crate::config::Toggle::Enabled(false);
            s.zstd = true;
        });
        let summary = pipeline(request, temp.path()).run().unwrap();
        assert_eq!(summary.per_algorithm.keys().copied().collect::<Vec<_>>(), vec![Algorithm::Zstd]);
        assert!(temp.path().join("data.json.zst").exists());
    }
}
