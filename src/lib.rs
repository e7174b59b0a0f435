#![doc = "md-combiner: gathers markdown from many repositories into one file."]

//! Each configured source is either a local directory or a remote git
//! repository that is cloned once into a cache directory and pulled on later
//! runs. Every `.md` file below the source's entry point is appended, in
//! sorted order, to a single artifact with a repository header, a per-file
//! header and `---` separators. Sources that cannot be resolved or contain no
//! documents are skipped without stopping the run.
//!
//! # Usage
//! Build an [`aggregate::Aggregator`] from a [`contract::RepositoryProvider`]
//! and an [`output::OutputWriter`], then call `run` with the sources from
//! [`load_config::load_config`]. The `md-combiner` binary does exactly this.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod contract;
pub mod discover;
pub mod error;
pub mod load_config;
pub mod output;
pub mod repository;

pub use aggregate::{AggregationReport, Aggregator, SkipReason, SourceOutcome, SourceReport};
pub use config::{CombineConfig, RepositorySource};
pub use error::{AggregateError, SourceError};
