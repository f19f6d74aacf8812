//! Extension-based content type lookup
//!
//! Classification never touches file contents. Unknown extensions yield
//! `None` and the caller decides what that means.

use std::path::Path;

/// Maps a path to its content type
pub trait ContentTypeClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> Option<&'static str>;
}

/// Static table keyed by lowercase file extension
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionClassifier;

impl ContentTypeClassifier for ExtensionClassifier {
    fn classify(&self, path: &Path) -> Option<&'static str> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        lookup(&extension)
    }
}

/// Content type registered for `extension` (lowercase, no dot)
pub fn lookup(extension: &str) -> Option<&'static str> {
    EXTENSION_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
}

const EXTENSION_TYPES: &[(&str, &str)] = &[
    // Markup and text
    ("html", "text/html"),
    ("htm", "text/html"),
    ("shtml", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("txt", "text/plain"),
    ("text", "text/plain"),
    ("log", "text/plain"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("ics", "text/calendar"),
    ("vtt", "text/vtt"),
    ("yaml", "text/yaml"),
    ("yml", "text/yaml"),
    // Scripts and data
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("cjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("jsonld", "application/ld+json"),
    ("webmanifest", "application/manifest+json"),
    ("geojson", "application/geo+json"),
    ("xml", "application/xml"),
    ("xsl", "application/xml"),
    ("rss", "application/rss+xml"),
    ("atom", "application/atom+xml"),
    ("wasm", "application/wasm"),
    ("rtf", "application/rtf"),
    ("toml", "application/toml"),
    ("pdf", "application/pdf"),
    ("bin", "application/octet-stream"),
    ("exe", "application/octet-stream"),
    // Fonts
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    // Images
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("ico", "image/x-icon"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    // Archives and already-compressed payloads
    ("gz", "application/gzip"),
    ("br", "application/x-brotli"),
    ("zst", "application/zstd"),
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("7z", "application/x-7z-compressed"),
    ("rar", "application/vnd.rar"),
    // Media
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
];
