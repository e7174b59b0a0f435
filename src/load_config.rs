/// `load_config` module: reads the YAML repository list and applies
/// environment overrides to produce a [`CombineConfig`].
///
/// # Precedence
/// For the artifact path: `OUTPUT_FILE`, then `output_path` in the file, then
/// [`DEFAULT_OUTPUT_PATH`]. The cache directory follows the same pattern with
/// `REPOS_CACHE_DIR`, `cache_dir` and [`DEFAULT_CACHE_DIR`]. Command-line flags
/// are applied on top of this by the CLI.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::{CombineConfig, RepositorySource, DEFAULT_CACHE_DIR, DEFAULT_OUTPUT_PATH};
use crate::repository::cache_dir_name;

pub const OUTPUT_FILE_ENV: &str = "OUTPUT_FILE";
pub const CACHE_DIR_ENV: &str = "REPOS_CACHE_DIR";

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    output_path: Option<PathBuf>,
    #[serde(default)]
    cache_dir: Option<PathBuf>,
    #[serde(default)]
    repositories: Option<Vec<RepositorySource>>,
}

/// Loads the YAML config at `path` and merges environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CombineConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config = parse_config(&config_content)?;
    info!(
        config_path = ?path_ref,
        output_path = %config.output_path.display(),
        sources = config.repositories.len(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

/// Parses YAML text and merges environment overrides.
pub fn parse_config(content: &str) -> Result<CombineConfig> {
    let raw: RawConfig = match serde_yaml::from_str(content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let output_path = env_path(OUTPUT_FILE_ENV)
        .or(raw.output_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));
    let cache_dir = env_path(CACHE_DIR_ENV)
        .or(raw.cache_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
    let repositories = raw.repositories.unwrap_or_default();

    validate_repositories(&repositories)?;

    Ok(CombineConfig {
        output_path,
        cache_dir,
        repositories,
    })
}

fn env_path(var: &str) -> Option<PathBuf> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            info!(var, value = %value, "Using environment override");
            Some(PathBuf::from(value))
        }
        _ => None,
    }
}

/// Names must be non-empty and unique, and remote sources must not share a
/// cache directory once sanitized.
fn validate_repositories(repositories: &[RepositorySource]) -> Result<()> {
    let mut names: HashMap<&str, usize> = HashMap::new();
    let mut cache_slots: HashMap<String, &str> = HashMap::new();

    for (index, source) in repositories.iter().enumerate() {
        if source.name.trim().is_empty() {
            error!(index, "Repository entry has an empty name");
            bail!("repositories[{index}]: name must not be empty");
        }
        if source.location.trim().is_empty() {
            error!(index, repository = %source.name, "Repository entry has an empty location");
            bail!("repositories[{index}] '{}': location must not be empty", source.name);
        }
        if let Some(first) = names.insert(source.name.as_str(), index) {
            error!(repository = %source.name, first, index, "Duplicate repository name");
            bail!(
                "repositories[{index}]: duplicate name '{}' (first used at index {first})",
                source.name
            );
        }
        if !source.is_local {
            let slot = cache_dir_name(&source.name);
            if let Some(other) = cache_slots.insert(slot.clone(), source.name.as_str()) {
                error!(repository = %source.name, other, slot = %slot, "Cache directory collision");
                bail!(
                    "repositories '{other}' and '{}' both map to cache directory '{slot}'",
                    source.name
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_names() {
        let sources = vec![RepositorySource::local(" ", "./docs")];
        let err = validate_repositories(&sources).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let sources = vec![
            RepositorySource::local("Docs", "./a"),
            RepositorySource::local("Docs", "./b"),
        ];
        let err = validate_repositories(&sources).unwrap_err();
        assert!(err.to_string().contains("duplicate name 'Docs'"));
    }

    #[test]
    fn rejects_remote_cache_collisions_but_not_local_ones() {
        let remote = vec![
            RepositorySource::remote("Memex Prime", "https://example.com/a.git"),
            RepositorySource::remote("memex-prime", "https://example.com/b.git"),
        ];
        let err = validate_repositories(&remote).unwrap_err();
        assert!(err.to_string().contains("memex-prime"));

        let local = vec![
            RepositorySource::local("Memex Prime", "./a"),
            RepositorySource::local("memex-prime", "./b"),
        ];
        assert!(validate_repositories(&local).is_ok());
    }
}
