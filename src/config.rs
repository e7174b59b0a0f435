use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_OUTPUT_PATH: &str = "public/data/combined-markdown.md";
pub const DEFAULT_CACHE_DIR: &str = "external-repos";

/// Everything a single combine run needs: where to write, where remote clones
/// live, and the ordered list of sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineConfig {
    pub output_path: PathBuf,
    pub cache_dir: PathBuf,
    pub repositories: Vec<RepositorySource>,
}

impl CombineConfig {
    pub fn trace_loaded(&self) {
        info!(
            output_path = %self.output_path.display(),
            cache_dir = %self.cache_dir.display(),
            sources_count = self.repositories.len(),
            "Loaded CombineConfig"
        );
        for source in &self.repositories {
            source.trace_loaded();
        }
        debug!(?self, "CombineConfig loaded (full debug)");
    }
}

/// One configured origin of markdown content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySource {
    /// Display name; also the cache key for remote sources.
    pub name: String,
    /// Local directory or remote clone URL.
    #[serde(alias = "repo_url")]
    pub location: String,
    /// Sub-path discovery is restricted to. Empty means the repository root.
    #[serde(default)]
    pub entry_point: String,
    #[serde(default)]
    pub is_local: bool,
}

impl RepositorySource {
    pub fn local(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            entry_point: String::new(),
            is_local: true,
        }
    }

    pub fn remote(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            entry_point: String::new(),
            is_local: false,
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn kind(&self) -> &'static str {
        if self.is_local {
            "local"
        } else {
            "remote"
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            repository = %self.name,
            kind = self.kind(),
            location = %self.location,
            entry_point = %self.entry_point,
            "Loaded repository source"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_kind_and_entry_point() {
        let local = RepositorySource::local("Docs", "./markdown");
        assert!(local.is_local);
        assert_eq!(local.kind(), "local");
        assert!(local.entry_point.is_empty());

        let remote = RepositorySource::remote("Wiki", "https://example.com/wiki.git")
            .with_entry_point("de");
        assert!(!remote.is_local);
        assert_eq!(remote.kind(), "remote");
        assert_eq!(remote.entry_point, "de");
    }

    #[test]
    fn repo_url_is_accepted_as_location() {
        let yaml = "name: Wiki\nrepo_url: https://example.com/wiki.git\n";
        let source: RepositorySource = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(source.location, "https://example.com/wiki.git");
        assert_eq!(source.entry_point, "");
        assert!(!source.is_local);
    }
}
