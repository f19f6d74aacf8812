use crate::request::Algorithm;
use crate::shared::ContentTypeClassifier;
use std::path::{Path, PathBuf};

/// Uncompressed binary or structured types outside `text/*` and the
/// `+json`/`+xml`/`+text` families
const COMPRESSIBLE_TYPES: &[&str] = &[
    "application/javascript",
    "application/json",
    "application/xml",
    "application/wasm",
    "application/rtf",
    "application/toml",
    "application/vnd.ms-fontobject",
    "font/ttf",
    "font/otf",
    "image/bmp",
    "image/x-icon",
];

/// Decides whether a content type benefits from general-purpose compression
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressibilityFilter {
    unknown_is_compressible: bool,
}

impl CompressibilityFilter {
    pub fn new(unknown_is_compressible: bool) -> Self {
        Self {
            unknown_is_compressible,
        }
    }

    pub fn is_eligible(&self, path: &Path, content_type: Option<&str>) -> bool {
        if has_artifact_suffix(path) {
            return false;
        }
        match content_type {
            Some(content_type) => is_compressible_type(content_type),
            None => self.unknown_is_compressible,
        }
    }
}

/// A discovered path with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub content_type: Option<&'static str>,
    pub eligible: bool,
}

impl CandidateFile {
    pub fn classify(
        path: PathBuf,
        classifier: &dyn ContentTypeClassifier,
        filter: &CompressibilityFilter,
    ) -> Self {
        let content_type = classifier.classify(&path);
        let eligible = filter.is_eligible(&path, content_type);
        Self {
            path,
            content_type,
            eligible,
        }
    }
}

/// Whether `content_type` is worth compressing; parameters after `;` are ignored
pub fn is_compressible_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("text/")
        || essence.ends_with("+json")
        || essence.ends_with("+xml")
        || essence.ends_with("+text")
        || COMPRESSIBLE_TYPES.contains(&essence.as_str())
}

fn has_artifact_suffix(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            Algorithm::ALL
                .iter()
                .any(|algorithm| ext.eq_ignore_ascii_case(algorithm.extension()))
        })
}
