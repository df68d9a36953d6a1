//! Maps decoded request paths onto the served root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::http::mime::content_type_for;

/// Outcome of resolving a request path. Always recomputed from filesystem
/// metadata; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedResource {
    File {
        path: PathBuf,
        /// Sent as Content-Length.
        size: u64,
        content_type: String,
    },
    Directory {
        path: PathBuf,
        /// Immediate children in enumeration order.
        entries: Vec<String>,
    },
    Missing,
    Unreadable,
}

/// Resolves request paths against a canonical served root.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    /// Canonicalizes `root`; fails if it does not exist.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = std::fs::canonicalize(root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins `request_path` onto the root and classifies the entry.
    ///
    /// The joined path is canonicalized; anything that lands outside the
    /// root (via `..` segments or symlinks) is reported as `Missing`.
    pub async fn resolve(&self, request_path: &str) -> ResolvedResource {
        let candidate = self.root.join(request_path.trim_start_matches('/'));

        let path = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) if is_missing(e.kind()) => return ResolvedResource::Missing,
            Err(e) => {
                warn!(path = %candidate.display(), error = %e, "Failed to resolve path");
                return ResolvedResource::Unreadable;
            }
        };

        if !path.starts_with(&self.root) {
            warn!(
                request_path,
                resolved = %path.display(),
                "Rejected path outside served root"
            );
            return ResolvedResource::Missing;
        }

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if is_missing(e.kind()) => return ResolvedResource::Missing,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat path");
                return ResolvedResource::Unreadable;
            }
        };

        if meta.is_dir() {
            match read_entries(&path).await {
                Ok(entries) => ResolvedResource::Directory { path, entries },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read directory");
                    ResolvedResource::Unreadable
                }
            }
        } else if meta.is_file() {
            let content_type = content_type_for(&path);
            ResolvedResource::File {
                path,
                size: meta.len(),
                content_type,
            }
        } else {
            // fifos, sockets, devices
            warn!(path = %path.display(), "Refusing to serve special file");
            ResolvedResource::Unreadable
        }
    }
}

fn is_missing(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::NotFound | ErrorKind::NotADirectory)
}

async fn read_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        entries.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(entries)
}
