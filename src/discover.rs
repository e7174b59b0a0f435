//! Recursive markdown discovery.

use futures::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::SourceError;

pub const DOCUMENT_EXTENSION: &str = ".md";

/// Walks a directory tree depth-first and collects every regular file whose
/// name ends in [`DOCUMENT_EXTENSION`].
///
/// A symlink with a matching name is returned when its target is a regular
/// file; symlinked directories are never descended into. A directory that
/// cannot be listed is logged and contributes nothing; the rest of the walk
/// continues.
/// The returned order is whatever the filesystem yields, so callers sort.
#[derive(Debug, Clone)]
pub struct DocumentDiscoverer {
    extension: String,
}

impl Default for DocumentDiscoverer {
    fn default() -> Self {
        Self {
            extension: DOCUMENT_EXTENSION.to_string(),
        }
    }
}

impl DocumentDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn discover(&self, root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        self.visit_dir(root.to_path_buf(), &mut found).await;
        info!(path = %root.display(), count = found.len(), "Completed document discovery");
        found
    }

    fn visit_dir<'a>(&'a self, dir: PathBuf, found: &'a mut Vec<PathBuf>) -> BoxFuture<'a, ()> {
        async move {
            if let Err(e) = self.list_dir(&dir, found).await {
                warn!(error = %e, "Skipping unreadable subtree");
            }
        }
        .boxed()
    }

    async fn list_dir(&self, dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), SourceError> {
        let io_err = |source| SourceError::DiscoveryIo {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!(error = ?e, path = %path.display(), "Failed to stat entry, skipping");
                    continue;
                }
            };

            if file_type.is_dir() {
                self.visit_dir(path, found).await;
            } else if file_type.is_file() && self.matches(&path) {
                debug!(path = %path.display(), "Discovered document");
                found.push(path);
            } else if file_type.is_symlink() && self.matches(&path) {
                match tokio::fs::metadata(&path).await {
                    Ok(target) if target.is_file() => {
                        debug!(path = %path.display(), "Discovered linked document");
                        found.push(path);
                    }
                    Ok(_) => debug!(path = %path.display(), "Link target is not a file, skipping"),
                    Err(e) => {
                        warn!(error = ?e, path = %path.display(), "Dangling document link, skipping")
                    }
                }
            }
        }
        Ok(())
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(&self.extension))
            .unwrap_or(false)
    }
}

/// Sorts paths lexicographically by their byte representation, which is the
/// order of their path strings rather than `Path`'s component-wise order.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}
