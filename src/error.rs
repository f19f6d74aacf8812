//! Error taxonomy for precompress
//!
//! Setup errors are fatal to a run and surface to the caller. Everything that
//! can go wrong while compressing a single file with a single algorithm is a
//! [`CompressError`] and is recorded as data in that file's outcome.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that abort a run before any file is compressed
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to enumerate files: {0}")]
    Enumeration(#[from] EnumerationError),

    #[error("failed to start worker {worker_id}: {source}")]
    PoolSpawn {
        worker_id: usize,
        #[source]
        source: io::Error,
    },
}

impl From<figment::Error> for SetupError {
    fn from(err: figment::Error) -> Self {
        SetupError::Config(Box::new(err))
    }
}

/// Failures of the file enumerator
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("cannot read search root {}: {source}", root.display())]
    UnreadableRoot {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

/// Failure of one algorithm on one file
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("{operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("run cancelled")]
    Cancelled,

    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl CompressError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompressError::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Reason a stream was interrupted mid-copy
///
/// Travels inside an [`io::Error`] through the codec so it can be recovered
/// on the other side with [`Interruption::from_io`].
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub(crate) enum Interruption {
    #[error("deadline of {0:?} exceeded")]
    Deadline(Duration),

    #[error("run cancelled")]
    Cancelled,
}

impl Interruption {
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::other(self)
    }

    pub(crate) fn from_io(err: &io::Error) -> Option<Self> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<Interruption>())
            .copied()
    }
}

impl From<Interruption> for CompressError {
    fn from(interruption: Interruption) -> Self {
        match interruption {
            Interruption::Deadline(limit) => CompressError::DeadlineExceeded(limit),
            Interruption::Cancelled => CompressError::Cancelled,
        }
    }
}
