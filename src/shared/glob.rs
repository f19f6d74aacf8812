//! Glob pattern utilities
//!
//! This module provides glob-based file discovery for the pipeline

use crate::error::EnumerationError;
use crate::logging::Logger;
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Source of candidate paths for a run
pub trait FileEnumerator: Send + Sync {
    /// Every file matching `pattern`. No match is an empty list, not an error.
    fn enumerate(&self, pattern: &str) -> Result<Vec<PathBuf>, EnumerationError>;
}

/// Walks the filesystem below the literal prefix of a glob pattern
pub struct GlobEnumerator {
    base_dir: PathBuf,
    logger: Logger,
}

impl GlobEnumerator {
    /// Resolve relative patterns against `base_dir`
    pub fn new<P: AsRef<Path>>(base_dir: P, logger: Logger) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            logger,
        }
    }

    fn output_path(&self, relative: &Path) -> PathBuf {
        if self.base_dir == Path::new(".") {
            relative.to_path_buf()
        } else {
            self.base_dir.join(relative)
        }
    }

    fn is_match(&self, matcher: &GlobMatcher, path: &Path) -> Option<PathBuf> {
        match path.strip_prefix(&self.base_dir) {
            Ok(relative) if matcher.is_match(relative) => Some(self.output_path(relative)),
            Ok(_) => None,
            // Absolute patterns walk outside the base directory
            Err(_) => matcher.is_match(path).then(|| path.to_path_buf()),
        }
    }
}

impl FileEnumerator for GlobEnumerator {
    fn enumerate(&self, pattern: &str) -> Result<Vec<PathBuf>, EnumerationError> {
        let pattern = strip_current_dir(pattern);
        let matcher = compile(pattern)?;

        if !is_glob_pattern(pattern) {
            let path = self.base_dir.join(pattern);
            return Ok(if path.is_file() {
                vec![self.output_path(Path::new(pattern))]
            } else {
                Vec::new()
            });
        }

        let prefix = literal_prefix(pattern);
        let root = if prefix.as_os_str().is_empty() {
            self.base_dir.clone()
        } else {
            self.base_dir.join(prefix)
        };
        if !root.exists() {
            self.logger
                .debug(format_args!("Search root {} does not exist", root.display()));
            return Ok(Vec::new());
        }
        if root.is_dir() {
            std::fs::read_dir(&root).map_err(|e| EnumerationError::UnreadableRoot {
                root: root.clone(),
                source: ignore::Error::from(e),
            })?;
        }

        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .hidden(true)
            .follow_links(false)
            .build();

        let mut matching_paths = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    // Symlinks are reported but not descended into; keep those that resolve to files
                    let is_file = entry.file_type().is_some_and(|ft| {
                        ft.is_file() || (ft.is_symlink() && entry.path().is_file())
                    });
                    if !is_file {
                        continue;
                    }
                    if let Some(path) = self.is_match(&matcher, entry.path()) {
                        matching_paths.push(path);
                    }
                }
                Err(e) => {
                    self.logger.warn(format_args!("Skipping unreadable entry: {e}"));
                }
            }
        }

        matching_paths.sort();
        matching_paths.dedup();
        Ok(matching_paths)
    }
}

/// Check if a string contains glob pattern characters
pub fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Drop leading `./` segments; walked paths never carry them
pub fn strip_current_dir(pattern: &str) -> &str {
    let mut rest = pattern;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    rest
}

/// Compile a pattern where `*` stays within one path segment and `**` spans many
pub fn compile(pattern: &str) -> Result<GlobMatcher, EnumerationError> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| EnumerationError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
    Ok(glob.compile_matcher())
}

/// Leading directories of a pattern that contain no glob characters
pub fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    let components: Vec<Component> = Path::new(pattern).components().collect();
    let Some((_, dirs)) = components.split_last() else {
        return prefix;
    };

    for component in dirs {
        if is_glob_pattern(&component.as_os_str().to_string_lossy()) {
            break;
        }
        prefix.push(component);
    }
    prefix
}
