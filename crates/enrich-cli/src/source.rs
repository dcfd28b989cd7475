//! Page source backed by a directory of captured pages

use async_trait::async_trait;
use enrich_pipeline::{NetworkFailure, PageResponse, PageSource};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Serves `<dir>/<cursor>.json`; a missing file answers `404`.
#[derive(Debug, Clone)]
pub struct DirectoryPageSource {
    root: PathBuf,
}

impl DirectoryPageSource {
    /// Serve pages from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the page for `cursor`
    pub fn path_for(&self, cursor: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(cursor)))
    }
}

/// Cursors may be paths (thread continuations); flatten them to one file name.
fn file_stem(cursor: &str) -> String {
    let stem: String = cursor
        .trim_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

#[async_trait]
impl PageSource for DirectoryPageSource {
    async fn request_page(&self, cursor: &str) -> Result<PageResponse, NetworkFailure> {
        let path = self.path_for(cursor);
        tracing::debug!(cursor, path = %path.display(), "Reading captured page");
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(PageResponse::ok(body)),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Ok(PageResponse::with_status(404, ""))
            }
            Err(error) => Err(NetworkFailure::rejected(cursor, error.to_string())),
        }
    }
}
