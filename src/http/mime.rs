//! Content-type detection from file extensions.

use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for `path`, guessed from its extension.
///
/// Textual types are labelled UTF-8; unknown or missing extensions fall back
/// to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    match mime_guess::from_path(path).first_raw() {
        Some(mime) if mime.starts_with("text/") => format!("{mime}; charset=utf-8"),
        Some(mime) => mime.to_string(),
        None => DEFAULT_CONTENT_TYPE.to_string(),
    }
}
