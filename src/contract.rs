//! # contract: seams between the aggregator and the outside world
//!
//! The aggregator only talks to repositories through [`RepositoryProvider`],
//! and the provider only talks to the version-control tool through
//! [`VersionControl`]. Both traits are async and object-safe, and both are
//! annotated for `mockall` so tests can assert exactly which operations a run
//! performed (for instance that a local source never triggers a clone).

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::RepositorySource;
use crate::error::SourceError;

/// A source that has been turned into a concrete local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    pub source: RepositorySource,
    /// Absolute root of the working copy (or of the local directory).
    pub local_root: PathBuf,
}

impl ResolvedRepository {
    /// Directory discovery is restricted to: the root joined with the entry
    /// point, or the root itself when the entry point is empty. A leading `/`
    /// on the entry point is ignored so the result stays below the root.
    pub fn entry_dir(&self) -> PathBuf {
        let relative: PathBuf = Path::new(&self.source.entry_point)
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        if relative.as_os_str().is_empty() {
            self.local_root.clone()
        } else {
            self.local_root.join(relative)
        }
    }
}

/// A discovered markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: PathBuf,
    /// Path relative to the resolved repository root, used in the
    /// `## File:` header.
    pub relative_path: PathBuf,
}

impl DocumentRef {
    /// Builds a reference for `path` inside `root`. Paths outside the root keep
    /// their absolute form as the relative part.
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        Self {
            path,
            relative_path,
        }
    }
}

/// Clone and update operations of the version-control tool.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into `dest`. `dest` may already exist as an empty directory.
    async fn clone_repository(&self, url: &str, dest: &Path) -> Result<(), SourceError>;

    /// Pull the latest revision into the working copy at `repo_dir`, failing on
    /// conflicts.
    async fn update(&self, repo_dir: &Path) -> Result<(), SourceError>;
}

/// Turns configured sources into local directories.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    async fn resolve(&self, source: &RepositorySource) -> Result<ResolvedRepository, SourceError>;
}
