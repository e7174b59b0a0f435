//! High-level pipeline: resolves every configured repository, discovers its
//! markdown documents and appends them, in order, to one combined artifact.
//!
//! For each source the aggregator walks the same fixed sequence of steps:
//!   - **Resolve** the source to a local directory through a [`RepositoryProvider`]
//!   - **Validate** that the entry point inside it is an existing directory
//!   - **Discover** every `.md` file below the entry point
//!   - **Sort** the documents by absolute path string
//!   - **Emit** a repository header, then each document with its own header,
//!     separated by `---`
//!
//! A source that fails any of the first three steps is skipped with a
//! [`SkipReason`] and the run moves on; skipped sources leave no trace in the
//! artifact. Only [`AggregateError`]s (the artifact cannot be written, a
//! discovered document cannot be read) end the run early.
//!
//! Document bytes are copied verbatim. A document that itself contains a
//! `---` line is not escaped, so it reads like an extra separator in the
//! rendered output.
//!
//! # Navigation
//! - Main entrypoint: [`Aggregator::run`]
//! - Supporting types: [`AggregationReport`], [`SourceReport`], [`SourceOutcome`]

use std::fmt;
use std::path::Path;
use tracing::{info, info_span, warn, Instrument};

use crate::config::RepositorySource;
use crate::contract::{DocumentRef, RepositoryProvider, ResolvedRepository};
use crate::discover::{sort_paths, DocumentDiscoverer};
use crate::error::{AggregateError, SourceError};
use crate::output::OutputWriter;

pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

pub fn repository_header(name: &str) -> String {
    format!("\n\n# Repository: {name}\n\n")
}

pub fn file_header(relative_path: &Path) -> String {
    format!("## File: {}\n\n", relative_path.display())
}

/// Why a source contributed nothing to the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    RepositoryUnavailable,
    EntryPointInvalid,
    NoDocuments,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::RepositoryUnavailable => "repository unavailable",
            SkipReason::EntryPointInvalid => "entry point invalid",
            SkipReason::NoDocuments => "no documents",
        };
        f.write_str(text)
    }
}

impl From<&SourceError> for SkipReason {
    fn from(e: &SourceError) -> Self {
        match e {
            SourceError::SourceUnavailable { .. } | SourceError::DiscoveryIo { .. } => {
                SkipReason::RepositoryUnavailable
            }
            SourceError::EntryPointInvalid { .. } => SkipReason::EntryPointInvalid,
            SourceError::NoDocumentsFound { .. } => SkipReason::NoDocuments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    Skipped(SkipReason),
    Completed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub outcome: SourceOutcome,
}

/// Result of one run: per-source outcomes in configuration order and the
/// number of documents written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub sources: Vec<SourceReport>,
    pub total_files: usize,
}

impl AggregationReport {
    pub fn skipped(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Skipped(_)))
    }

    /// One-line, user-facing summary of the run.
    pub fn summary(&self, output: &Path) -> String {
        if self.total_files == 0 {
            "No markdown files were processed from any repository".to_string()
        } else {
            format!(
                "Successfully combined {} markdown files into '{}'",
                self.total_files,
                output.display()
            )
        }
    }
}

/// Run-scoped mutable state; lives for exactly one [`Aggregator::run`].
#[derive(Debug, Default)]
struct AggregationState {
    processed_files: usize,
}

pub struct Aggregator<P> {
    provider: P,
    discoverer: DocumentDiscoverer,
    writer: OutputWriter,
}

impl<P: RepositoryProvider> Aggregator<P> {
    pub fn new(provider: P, writer: OutputWriter) -> Self {
        Self {
            provider,
            discoverer: DocumentDiscoverer::new(),
            writer,
        }
    }

    /// Truncates the artifact, then processes `sources` strictly in order.
    pub async fn run(
        &self,
        sources: &[RepositorySource],
    ) -> Result<AggregationReport, AggregateError> {
        info!(
            sources = sources.len(),
            output = %self.writer.path().display(),
            "Starting markdown combination"
        );
        self.writer.reset().await?;

        let mut state = AggregationState::default();
        let mut reports = Vec::with_capacity(sources.len());

        for source in sources {
            let span = info_span!("source", repository = %source.name);
            let outcome = self
                .process_source(source, &mut state)
                .instrument(span)
                .await?;
            reports.push(SourceReport {
                name: source.name.clone(),
                outcome,
            });
        }

        let report = AggregationReport {
            sources: reports,
            total_files: state.processed_files,
        };
        info!(
            total_files = report.total_files,
            skipped = report.skipped().count(),
            "Markdown combination finished"
        );
        Ok(report)
    }

    async fn process_source(
        &self,
        source: &RepositorySource,
        state: &mut AggregationState,
    ) -> Result<SourceOutcome, AggregateError> {
        info!(repository = %source.name, kind = source.kind(), "Processing repository");

        let (resolved, documents) = match self.collect(source).await {
            Ok(found) => found,
            Err(e) => {
                let reason = SkipReason::from(&e);
                match &e {
                    SourceError::NoDocumentsFound { .. } => {
                        info!(repository = %source.name, %reason, "No markdown files found, skipping")
                    }
                    _ => warn!(repository = %source.name, %reason, error = %e, "Skipping repository"),
                }
                return Ok(SourceOutcome::Skipped(reason));
            }
        };

        self.emit(&resolved, &documents, state).await?;
        Ok(SourceOutcome::Completed(documents.len()))
    }

    /// Resolve, validate, discover and sort. Every failure here is a skip.
    async fn collect(
        &self,
        source: &RepositorySource,
    ) -> Result<(ResolvedRepository, Vec<DocumentRef>), SourceError> {
        let resolved = self.provider.resolve(source).await?;

        let entry_dir = resolved.entry_dir();
        info!(path = %entry_dir.display(), "Searching for markdown files");
        match tokio::fs::metadata(&entry_dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(SourceError::EntryPointInvalid { path: entry_dir }),
        }

        let mut paths = self.discoverer.discover(&entry_dir).await;
        if paths.is_empty() {
            return Err(SourceError::NoDocumentsFound { path: entry_dir });
        }
        sort_paths(&mut paths);

        let documents = paths
            .into_iter()
            .map(|path| DocumentRef::new(&resolved.local_root, path))
            .collect();
        Ok((resolved, documents))
    }

    async fn emit(
        &self,
        resolved: &ResolvedRepository,
        documents: &[DocumentRef],
        state: &mut AggregationState,
    ) -> Result<(), AggregateError> {
        let total = documents.len();
        info!(repository = %resolved.source.name, count = total, "Found markdown files");

        self.writer
            .append(repository_header(&resolved.source.name))
            .await?;

        for (i, document) in documents.iter().enumerate() {
            info!(path = %document.path.display(), "Processing [{}/{}]", i + 1, total);

            if i > 0 {
                self.writer.append(DOCUMENT_SEPARATOR).await?;
            }
            self.writer
                .append(file_header(&document.relative_path))
                .await?;

            let content = tokio::fs::read(&document.path).await.map_err(|e| {
                AggregateError::ReadDocument {
                    path: document.path.clone(),
                    source: e,
                }
            })?;
            self.writer.append(content).await?;
            state.processed_files += 1;
        }
        Ok(())
    }
}
