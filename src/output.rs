use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::error::AggregateError;

/// Sole writer of the combined artifact for one run.
///
/// [`reset`](Self::reset) is called once at the start of a run; every later
/// write goes through [`append`](Self::append) in call order.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    path: PathBuf,
}

impl OutputWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates missing parent directories and truncates the artifact to empty.
    pub async fn reset(&self) -> Result<(), AggregateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!(error = ?e, path = %parent.display(), "Failed to create output directory");
                AggregateError::OutputDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                }
            })?;
            debug!(path = %parent.display(), "Output directory ready");
        }

        tokio::fs::write(&self.path, b"")
            .await
            .map_err(|e| self.write_error(e))?;
        info!(path = %self.path.display(), "Output file truncated");
        Ok(())
    }

    pub async fn append(&self, text: impl AsRef<[u8]>) -> Result<(), AggregateError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_error(e))?;
        file.write_all(text.as_ref())
            .await
            .map_err(|e| self.write_error(e))?;
        file.flush().await.map_err(|e| self.write_error(e))?;
        Ok(())
    }

    fn write_error(&self, e: std::io::Error) -> AggregateError {
        error!(error = ?e, path = %self.path.display(), "Failed to write output file");
        AggregateError::OutputWrite {
            path: self.path.clone(),
            source: e,
        }
    }
}
