//! Command-line glue for `md-combiner`: argument parsing, config loading and
//! user-visible output. All pipeline logic lives in [`crate::aggregate`].
//!
//! [`run`] is public so integration tests can drive the CLI without spawning
//! the binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::aggregate::{Aggregator, SourceOutcome};
use crate::config::CombineConfig;
use crate::load_config::load_config;
use crate::output::OutputWriter;
use crate::repository::{cache_dir_name, CachedRepositoryProvider};

pub const DEFAULT_CONFIG_PATH: &str = "repo-config.yaml";

/// CLI for md-combiner: gather markdown from many repositories into one file.
#[derive(Parser)]
#[clap(
    name = "md-combiner",
    version,
    about = "Combine markdown documents from local and git repositories into one file"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone or update every repository and write the combined markdown file
    Combine {
        /// Path to the YAML repository config
        #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Output file; overrides OUTPUT_FILE and the config file
        #[clap(long)]
        output: Option<PathBuf>,
        /// Cache directory for remote clones; overrides REPOS_CACHE_DIR and the config file
        #[clap(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Print the configured repositories without fetching anything
    List {
        /// Path to the YAML repository config
        #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Combine {
            config,
            output,
            cache_dir,
        } => {
            let mut config = load_config(&config)?;
            if let Some(output) = output {
                config.output_path = output;
            }
            if let Some(cache_dir) = cache_dir {
                config.cache_dir = cache_dir;
            }
            config.trace_loaded();
            combine(&config).await
        }
        Commands::List { config } => {
            let config = load_config(&config)?;
            list(&config);
            Ok(())
        }
    }
}

async fn combine(config: &CombineConfig) -> Result<()> {
    tracing::info!(command = "combine", "Starting markdown combination process");
    println!("Starting markdown combination process...");

    let provider = CachedRepositoryProvider::with_git(&config.cache_dir);
    let aggregator = Aggregator::new(provider, OutputWriter::new(&config.output_path));

    let report = match aggregator.run(&config.repositories).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(command = "combine", error = %e, "Combination failed");
            eprintln!("[ERROR] Combination failed: {e}");
            return Err(e).context("markdown combination failed");
        }
    };

    for source in &report.sources {
        match source.outcome {
            SourceOutcome::Completed(count) => {
                println!("  {}: {} markdown files", source.name, count)
            }
            SourceOutcome::Skipped(reason) => {
                eprintln!("  {}: skipped ({})", source.name, reason)
            }
        }
    }
    println!("{}", report.summary(&config.output_path));
    println!("Report:");
    println!("{:#?}", report);
    tracing::info!(command = "combine", ?report, "Combination complete");
    Ok(())
}

fn list(config: &CombineConfig) {
    println!("Output file: {}", config.output_path.display());
    println!("Cache directory: {}", config.cache_dir.display());
    for (i, source) in config.repositories.iter().enumerate() {
        let entry_point = if source.entry_point.is_empty() {
            "<root>"
        } else {
            source.entry_point.as_str()
        };
        println!(
            "{}. {} [{}] {} (entry point: {})",
            i + 1,
            source.name,
            source.kind(),
            source.location,
            entry_point
        );
        if !source.is_local {
            println!(
                "   cache: {}",
                config.cache_dir.join(cache_dir_name(&source.name)).display()
            );
        }
    }
}
