//! Error types shared across the pipeline.
//!
//! [`SourceError`] covers everything that can go wrong for a single configured
//! repository; the aggregator turns it into a skip and moves on to the next
//! source. [`AggregateError`] is the only kind of error that ends a run.

use std::path::PathBuf;
use thiserror::Error;

/// Recoverable, per-source failure.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Clone or update of a remote repository failed, or its cache slot could
    /// not be prepared.
    #[error("repository '{name}' unavailable: {details}")]
    SourceUnavailable { name: String, details: String },

    /// The entry point is missing or is not a directory.
    #[error("entry point '{}' is missing or not a directory", path.display())]
    EntryPointInvalid { path: PathBuf },

    /// A directory could not be listed during discovery.
    #[error("failed to list directory '{}': {source}", path.display())]
    DiscoveryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no markdown documents found under '{}'", path.display())]
    NoDocumentsFound { path: PathBuf },
}

/// Fatal failure that terminates the whole run.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to prepare output directory '{}': {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output file '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read document '{}': {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
