//! Serving files for paths no route claims.

use crate::router::matcher::strip_query;
use mime::Mime;
use quill_http::buf::SplitBytes;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str;
use tracing::{debug, trace};

const INDEX_FILE: &str = "index.html";

/// A file ready to be written as a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub content: Vec<u8>,
    pub mime: Mime,
}

/// Looks up static content by request path.
pub trait StaticFileResolver: Send + Sync {
    fn resolve(&self, path: &[u8]) -> Option<StaticFile>;
}

/// Resolves paths against a directory on disk.
///
/// Only plain relative segments are accepted: a path with `..`, `.`, a
/// backslash or an empty segment in the middle resolves to nothing. A path
/// naming a directory serves its `index.html`.
pub struct StaticDirectory {
    root: PathBuf,
}

impl StaticDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, path: &[u8]) -> Option<PathBuf> {
        let path = strip_query(path);
        let path = path.strip_prefix(b"/").unwrap_or(path);

        let mut file = self.root.clone();
        for segment in SplitBytes::new(path, b'/') {
            let segment = str::from_utf8(segment).ok()?;
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                trace!(segment, "rejected static file path");
                return None;
            }
            file.push(segment);
        }

        if path.is_empty() || path.ends_with(b"/") || file.is_dir() {
            file.push(INDEX_FILE);
        }
        Some(file)
    }
}

impl StaticFileResolver for StaticDirectory {
    fn resolve(&self, path: &[u8]) -> Option<StaticFile> {
        let file = self.file_path(path)?;
        match std::fs::read(&file) {
            Ok(content) => Some(StaticFile { content, mime: mime_for(&file) }),
            Err(e) => {
                debug!(file = %file.display(), cause = %e, "static file not readable");
                None
            }
        }
    }
}

impl fmt::Debug for StaticDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDirectory").field("root", &self.root).finish()
    }
}

/// Picks a content type from the file extension.
pub fn mime_for(file: &Path) -> Mime {
    let extension = file.extension().and_then(|extension| extension.to_str()).unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => mime::TEXT_HTML_UTF_8,
        "css" => mime::TEXT_CSS_UTF_8,
        "js" | "mjs" => mime::APPLICATION_JAVASCRIPT_UTF_8,
        "json" => mime::APPLICATION_JSON,
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "csv" => mime::TEXT_CSV_UTF_8,
        "xml" => mime::TEXT_XML,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "woff" => mime::FONT_WOFF,
        "woff2" => mime::FONT_WOFF2,
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
