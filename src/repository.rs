//! Repository acquisition: local passthrough, or clone-or-update of a remote
//! repository inside a persistent cache directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::RepositorySource;
use crate::contract::{RepositoryProvider, ResolvedRepository, VersionControl};
use crate::error::SourceError;

/// Cache directory name for a source: the name is lowercased, then every
/// character outside `[a-z0-9]` becomes `-`.
pub fn cache_dir_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, name: &str, command: &mut Command) -> Result<(), SourceError> {
        let output = command.output().await.map_err(|e| {
            error!(error = ?e, program = %self.program.display(), "Failed to launch git process");
            SourceError::SourceUnavailable {
                name: name.to_string(),
                details: format!("failed to launch {}: {e}", self.program.display()),
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, stderr = %stderr, "Git exited with non-zero code");
            return Err(SourceError::SourceUnavailable {
                name: name.to_string(),
                details: if stderr.is_empty() {
                    format!("git exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repository(&self, url: &str, dest: &Path) -> Result<(), SourceError> {
        info!(repo_url = url, path = %dest.display(), "Cloning git repository");
        let mut command = Command::new(&self.program);
        command.arg("clone").arg(url).arg(dest);
        self.run(url, &mut command).await?;
        info!(repo_url = url, path = %dest.display(), "Successfully cloned git repository");
        Ok(())
    }

    async fn update(&self, repo_dir: &Path) -> Result<(), SourceError> {
        info!(path = %repo_dir.display(), "Pulling latest revision");
        // An explicit --git-dir keeps git from walking up into an enclosing
        // repository when the cache slot holds no clone.
        let mut command = Command::new(&self.program);
        command
            .current_dir(repo_dir)
            .arg("--git-dir")
            .arg(repo_dir.join(".git"))
            .arg("pull");
        self.run(&repo_dir.display().to_string(), &mut command).await?;
        info!(path = %repo_dir.display(), "Updated git repository");
        Ok(())
    }
}

/// Default [`RepositoryProvider`]: local sources pass through, remote sources
/// are cloned into (or updated inside) `cache_root`.
pub struct CachedRepositoryProvider<V> {
    cache_root: PathBuf,
    vcs: V,
}

impl CachedRepositoryProvider<GitCli> {
    pub fn with_git(cache_root: impl Into<PathBuf>) -> Self {
        Self::new(cache_root, GitCli::new())
    }
}

impl<V: VersionControl> CachedRepositoryProvider<V> {
    pub fn new(cache_root: impl Into<PathBuf>, vcs: V) -> Self {
        Self {
            cache_root: cache_root.into(),
            vcs,
        }
    }

    async fn clone_or_update(&self, source: &RepositorySource) -> Result<PathBuf, SourceError> {
        let unavailable = |details: String| SourceError::SourceUnavailable {
            name: source.name.clone(),
            details,
        };

        let cache_root = std::path::absolute(&self.cache_root)
            .map_err(|e| unavailable(format!("invalid cache directory: {e}")))?;
        let repo_dir = cache_root.join(cache_dir_name(&source.name));

        let cached = tokio::fs::try_exists(&repo_dir).await.map_err(|e| {
            error!(error = ?e, path = %repo_dir.display(), "Failed to inspect cache directory");
            unavailable(format!(
                "failed to inspect cache directory {}: {e}",
                repo_dir.display()
            ))
        })?;

        if cached {
            info!(repository = %source.name, path = %repo_dir.display(), "Updating cached repository");
            self.vcs.update(&repo_dir).await?;
        } else {
            // The slot is created before cloning so the next run updates it
            // instead of cloning again, whatever this clone's outcome.
            tokio::fs::create_dir_all(&repo_dir).await.map_err(|e| {
                error!(error = ?e, path = %repo_dir.display(), "Failed to create cache directory");
                unavailable(format!(
                    "failed to create cache directory {}: {e}",
                    repo_dir.display()
                ))
            })?;
            debug!(path = %repo_dir.display(), "Created cache directory");
            info!(
                repository = %source.name,
                repo_url = %source.location,
                path = %repo_dir.display(),
                "Cloning repository into cache"
            );
            self.vcs.clone_repository(&source.location, &repo_dir).await?;
        }
        Ok(repo_dir)
    }
}

#[async_trait]
impl<V: VersionControl> RepositoryProvider for CachedRepositoryProvider<V> {
    async fn resolve(&self, source: &RepositorySource) -> Result<ResolvedRepository, SourceError> {
        let local_root = if source.is_local {
            info!(repository = %source.name, location = %source.location, "Using local repository");
            std::path::absolute(&source.location).map_err(|e| SourceError::SourceUnavailable {
                name: source.name.clone(),
                details: format!("invalid local path '{}': {e}", source.location),
            })?
        } else {
            self.clone_or_update(source).await?
        };

        Ok(ResolvedRepository {
            source: source.clone(),
            local_root,
        })
    }
}
