//! Per-file streaming compression
//!
//! A [`StreamCompressor`] turns one source file into one sibling artifact per
//! enabled algorithm. Algorithms for the same file run on scoped threads, each
//! with its own source handle, so one codec failing never disturbs another.

use super::outcome::{AlgorithmResult, AlgorithmSuccess, CompressionOutcome};
use crate::error::{CompressError, Interruption};
use crate::logging::Logger;
use crate::parallel::CancellationFlag;
use crate::parallel::pool::panic_message;
use crate::request::{Algorithm, CompressionRequest};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Unit of work executed by a pool worker
pub trait FileCompressor: Send + Sync + 'static {
    /// Algorithms every outcome will report on
    fn algorithms(&self) -> Vec<Algorithm>;

    /// Compress one file; never fails as a whole, failures live in the outcome
    fn compress(&self, path: &Path) -> CompressionOutcome;
}

/// `<path>.<ext>` for the given algorithm
pub fn output_path(path: &Path, algorithm: Algorithm) -> PathBuf {
    let mut output = path.as_os_str().to_owned();
    output.push(".");
    output.push(algorithm.extension());
    PathBuf::from(output)
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

/// Streams files through the codecs enabled in a [`CompressionRequest`]
pub struct StreamCompressor {
    request: Arc<CompressionRequest>,
    logger: Logger,
    cancellation: CancellationFlag,
}

impl StreamCompressor {
    pub fn new(request: Arc<CompressionRequest>, logger: Logger, cancellation: CancellationFlag) -> Self {
        Self {
            request,
            logger,
            cancellation,
        }
    }

    fn compress_with(&self, path: &Path, algorithm: Algorithm, deadline: Option<Deadline>) -> AlgorithmResult {
        let started = Instant::now();
        let output = output_path(path, algorithm);
        self.logger
            .debug(format_args!("Compressing {} with {algorithm}", path.display()));

        let source = File::open(path).map_err(|e| CompressError::io("open", path, e))?;
        let target = File::create(&output).map_err(|e| CompressError::io("create", &output, e))?;

        let buffer_size = self.request.buffer_size;
        let mut reader = GuardedReader {
            inner: BufReader::with_capacity(buffer_size, source),
            deadline,
            cancellation: &self.cancellation,
            bytes_read: 0,
        };
        let mut writer = CountingWriter {
            inner: BufWriter::with_capacity(buffer_size, target),
            bytes_written: 0,
        };

        let streamed = self
            .encode(algorithm, &mut reader, &mut writer)
            .and_then(|()| writer.flush());

        if let Err(err) = streamed {
            drop(writer);
            if let Err(remove_err) = fs::remove_file(&output) {
                self.logger.warn(format_args!(
                    "Could not remove partial output {}: {remove_err}",
                    output.display()
                ));
            }
            return Err(match Interruption::from_io(&err) {
                Some(interruption) => interruption.into(),
                None => CompressError::io("compress", path, err),
            });
        }

        Ok(AlgorithmSuccess {
            output,
            bytes_read: reader.bytes_read,
            bytes_written: writer.bytes_written,
            elapsed: started.elapsed(),
        })
    }

    fn encode<R: Read, W: Write>(&self, algorithm: Algorithm, reader: &mut R, writer: &mut W) -> io::Result<()> {
        match algorithm {
            Algorithm::Gzip => {
                let options = self.request.gzip.options().unwrap_or_default();
                let mut encoder = GzEncoder::new(writer, Compression::new(options.level));
                io::copy(reader, &mut encoder)?;
                encoder.finish()?;
            }
            Algorithm::Brotli => {
                let options = self.request.brotli.options().unwrap_or_default();
                let mut params = brotli::enc::BrotliEncoderParams::default();
                params.quality = options.quality as i32;
                params.lgwin = options.window as i32;
                brotli::BrotliCompress(reader, writer, &params)?;
            }
            Algorithm::Zstd => {
                zstd::stream::copy_encode(reader, writer, zstd::DEFAULT_COMPRESSION_LEVEL)?;
            }
        }
        Ok(())
    }
}

impl FileCompressor for StreamCompressor {
    fn algorithms(&self) -> Vec<Algorithm> {
        self.request.enabled_algorithms()
    }

    fn compress(&self, path: &Path) -> CompressionOutcome {
        self.logger
            .info(format_args!("Starting compression for {}", path.display()));

        let algorithms = self.algorithms();
        let deadline = self.request.file_timeout.map(|limit| Deadline {
            at: Instant::now() + limit,
            limit,
        });

        let scoped = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = algorithms
                .iter()
                .map(|&algorithm| (algorithm, s.spawn(move |_| self.compress_with(path, algorithm, deadline))))
                .collect();

            handles
                .into_iter()
                .map(|(algorithm, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|payload| Err(CompressError::Panicked(panic_message(payload.as_ref()))));
                    (algorithm, result)
                })
                .collect::<BTreeMap<_, _>>()
        });

        let outcome = match scoped {
            Ok(results) => CompressionOutcome {
                source: path.to_path_buf(),
                results,
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                CompressionOutcome::failed_all(path.to_path_buf(), &algorithms, || {
                    CompressError::Panicked(message.clone())
                })
            }
        };

        for (algorithm, result) in &outcome.results {
            match result {
                Ok(_) => self
                    .logger
                    .info(format_args!("{} compressed with {algorithm}", path.display())),
                Err(err) => self.logger.error(format_args!(
                    "Error while compressing {} with {algorithm}: {err}",
                    path.display()
                )),
            }
        }
        self.logger
            .info(format_args!("Finished compression for {}", path.display()));

        outcome
    }
}

/// Source reader that honours cancellation and the per-file deadline
struct GuardedReader<'a, R> {
    inner: R,
    deadline: Option<Deadline>,
    cancellation: &'a CancellationFlag,
    bytes_read: u64,
}

impl<R: Read> Read for GuardedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancellation.is_cancelled() {
            return Err(Interruption::Cancelled.into_io());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline.at {
                return Err(Interruption::Deadline(deadline.limit).into_io());
            }
        }
        let read = self.inner.read(buf)?;
        self.bytes_read += read as u64;
        Ok(read)
    }
}

struct CountingWriter<W> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, Toggle};
    use crate::logging::LogLevel;
    use crate::pipeline::outcome::FileStatus;
    use crate::request::GzipOptions;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn request(gzip: bool, brotli: bool, zstd: bool) -> CompressionRequest {
        let settings = Settings {
            glob: Some("**/*".to_string()),
            gzip: Toggle::Enabled(gzip),
            brotli: Toggle::Enabled(brotli),
            zstd,
            ..Settings::default()
        };
        CompressionRequest::from_settings(&settings).unwrap()
    }

    fn compressor(request: CompressionRequest) -> StreamCompressor {
        StreamCompressor::new(
            Arc::new(request),
            Logger::new(LogLevel::Error),
            CancellationFlag::new(),
        )
    }

    fn gunzip(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    fn unbrotli(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        brotli::Decompressor::new(File::open(path).unwrap(), 4096)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(
            output_path(Path::new("site/index.html"), Algorithm::Brotli),
            PathBuf::from("site/index.html.br")
        );
        assert_eq!(
            output_path(Path::new("app.min.js"), Algorithm::Zstd),
            PathBuf::from("app.min.js.zst")
        );
    }

    #[test]
    fn test_all_algorithms_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("styles.css");
        let content = "body { color: red; }\n".repeat(500);
        fs::write(&source, &content).unwrap();

        let outcome = compressor(request(true, true, true)).compress(&source);
        assert_eq!(outcome.status(), FileStatus::Succeeded);
        assert_eq!(outcome.results.len(), 3);

        let gz = outcome.results[&Algorithm::Gzip].as_ref().unwrap();
        assert_eq!(gz.output, output_path(&source, Algorithm::Gzip));
        assert_eq!(gz.bytes_read, content.len() as u64);
        assert_eq!(gz.bytes_written, fs::metadata(&gz.output).unwrap().len());
        assert!(gz.bytes_written < content.len() as u64);

        assert_eq!(gunzip(&gz.output), content.as_bytes());
        assert_eq!(
            unbrotli(&output_path(&source, Algorithm::Brotli)),
            content.as_bytes()
        );
        let zst = fs::read(output_path(&source, Algorithm::Zstd)).unwrap();
        assert_eq!(zstd::stream::decode_all(&zst[..]).unwrap(), content.as_bytes());
    }

    #[test]
    fn test_empty_file_produces_valid_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("empty.txt");
        fs::write(&source, "").unwrap();

        let outcome = compressor(request(true, true, false)).compress(&source);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.status(), FileStatus::Succeeded);

        assert!(gunzip(&output_path(&source, Algorithm::Gzip)).is_empty());
        assert!(unbrotli(&output_path(&source, Algorithm::Brotli)).is_empty());
    }

    #[test]
    fn test_gzip_options_are_applied() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("data.json");
        let content = "{\"key\": \"value\"}\n".repeat(2000);
        fs::write(&source, &content).unwrap();

        let mut stored = request(true, false, false);
        stored.gzip = crate::request::AlgorithmSpec::from(Toggle::Options(GzipOptions { level: 0 }));
        let outcome = compressor(stored).compress(&source);

        let gz = outcome.results[&Algorithm::Gzip].as_ref().unwrap();
        // Level 0 stores the data, so the artifact is larger than the input
        assert!(gz.bytes_written > content.len() as u64);
        assert_eq!(gunzip(&gz.output), content.as_bytes());
    }

    #[test]
    fn test_one_algorithm_failing_leaves_others_intact() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("page.html");
        fs::write(&source, "<html></html>").unwrap();
        // A directory squatting on the gzip output path makes that algorithm fail
        fs::create_dir(output_path(&source, Algorithm::Gzip)).unwrap();

        let outcome = compressor(request(true, true, false)).compress(&source);
        assert_eq!(outcome.status(), FileStatus::PartiallyFailed);
        assert!(matches!(
            outcome.results[&Algorithm::Gzip],
            Err(CompressError::Io { operation: "create", .. })
        ));
        assert!(outcome.results[&Algorithm::Brotli].is_ok());
        assert!(output_path(&source, Algorithm::Gzip).is_dir());
        assert_eq!(
            unbrotli(&output_path(&source, Algorithm::Brotli)),
            b"<html></html>"
        );
    }

    #[test]
    fn test_missing_source_fails_every_algorithm() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("gone.txt");

        let outcome = compressor(request(true, true, false)).compress(&source);
        assert_eq!(outcome.status(), FileStatus::Failed);
        for result in outcome.results.values() {
            assert!(matches!(result, Err(CompressError::Io { operation: "open", .. })));
        }
        assert!(!output_path(&source, Algorithm::Gzip).exists());
    }

    #[test]
    fn test_cancelled_run_removes_partial_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("big.txt");
        fs::write(&source, "lorem ipsum ".repeat(10_000)).unwrap();

        let cancellation = CancellationFlag::new();
        cancellation.cancel();
        let compressor = StreamCompressor::new(
            Arc::new(request(true, true, true)),
            Logger::new(LogLevel::Error),
            cancellation,
        );

        let outcome = compressor.compress(&source);
        assert_eq!(outcome.status(), FileStatus::Failed);
        for (algorithm, result) in &outcome.results {
            assert!(matches!(result, Err(CompressError::Cancelled)));
            assert!(!output_path(&source, *algorithm).exists());
        }
    }

    #[test]
    fn test_deadline_exceeded() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("slow.txt");
        fs::write(&source, "data").unwrap();

        let mut timed = request(true, false, false);
        timed.file_timeout = Some(Duration::ZERO);
        let outcome = compressor(timed).compress(&source);

        assert!(matches!(
            outcome.results[&Algorithm::Gzip],
            Err(CompressError::DeadlineExceeded(limit)) if limit == Duration::ZERO
        ));
        assert!(!output_path(&source, Algorithm::Gzip).exists());
    }
}
