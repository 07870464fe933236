//! Configuration types for wikigraph.
//!
//! Follows a builder pattern for complex configuration with validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Link index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Document extensions (without dot) tried during link resolution and listing
    pub extensions: Vec<String>,
    /// Directory or file names skipped when listing the corpus
    pub excluded_paths: HashSet<String>,
    /// Bytes of context captured on each side of a link for backlink snippets
    pub snippet_radius: usize,
    /// Files larger than this are not indexed
    pub max_file_size: u64,
    /// File names never reported as orphaned (landing pages)
    pub orphan_exempt: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            excluded_paths: [".git", ".obsidian", ".trash", "node_modules"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            snippet_radius: 50,
            max_file_size: 10 * 1024 * 1024, // 10MB
            orphan_exempt: ["index.md", "_index.md", "README.md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Derived-edge settings for graph builds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Emit tag-relation edges between documents sharing tags
    pub tag_relations: bool,
    /// Minimum number of shared tags for a tag-relation edge
    pub min_shared_tags: usize,
    /// Emit category-relation edges between documents in the same category
    pub category_relations: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tag_relations: false,
            min_shared_tags: 2,
            category_relations: false,
        }
    }
}

/// Graph analytics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Size of the top-K rankings in reports
    pub top_k: usize,
    /// Out-degree at or above which a node is reported as a hub
    pub hub_threshold: usize,
    /// Normalized betweenness at or above which a node is reported as a bridge
    pub bridge_threshold: f64,
    pub pagerank_damping: f64,
    pub pagerank_iterations: usize,
    /// Hard stop for label propagation rounds
    pub label_propagation_iterations: usize,
    /// Seed for the clustering RNG; unseeded runs use OS entropy
    pub random_seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            hub_threshold: 5,
            bridge_threshold: 0.1,
            pagerank_damping: 0.85,
            pagerank_iterations: 50,
            label_propagation_iterations: 100,
            random_seed: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiGraphConfig {
    /// Corpus root directory
    pub root: PathBuf,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WikiGraphConfig {
    /// Create a config with defaults for the given root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: IndexConfig::default(),
            graph: GraphConfig::default(),
            analysis: AnalysisConfig::default(),
            log_level: default_log_level(),
        }
    }

    /// Create a new config with builder
    pub fn builder(root: impl Into<PathBuf>) -> WikiGraphConfigBuilder {
        WikiGraphConfigBuilder::new(root)
    }

    /// Validate the configuration values (does not touch the filesystem)
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config_error("Corpus root cannot be empty"));
        }

        if self.index.extensions.is_empty() {
            return Err(Error::config_error(
                "At least one document extension must be configured",
            ));
        }

        if self
            .index
            .extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(Error::config_error(
                "Extensions must be non-empty and given without a leading dot",
            ));
        }

        if self.graph.min_shared_tags == 0 {
            return Err(Error::config_error("min_shared_tags must be at least 1"));
        }

        let damping = self.analysis.pagerank_damping;
        if !(damping > 0.0 && damping < 1.0) {
            return Err(Error::config_error(format!(
                "pagerank_damping must be in (0, 1), got {}",
                damping
            )));
        }

        if self.analysis.top_k == 0 {
            return Err(Error::config_error("top_k must be at least 1"));
        }

        Ok(())
    }

    /// Check that the root exists and is a directory
    pub fn validate_root(&self) -> Result<()> {
        if !self.root.exists() {
            return Err(Error::config_error(format!(
                "Corpus root does not exist: {}",
                self.root.display()
            )));
        }

        if !self.root.is_dir() {
            return Err(Error::config_error(format!(
                "Corpus root is not a directory: {}",
                self.root.display()
            )));
        }

        Ok(())
    }

    /// Load configuration from a YAML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to load configuration from {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize configuration: {}", e)))?;

        tokio::fs::write(path, yaml).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to save configuration to {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Builder for WikiGraphConfig
pub struct WikiGraphConfigBuilder {
    config: WikiGraphConfig,
}

impl WikiGraphConfigBuilder {
    /// Create a new builder
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: WikiGraphConfig::new(root),
        }
    }

    /// Replace the document extensions
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.index.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn snippet_radius(mut self, radius: usize) -> Self {
        self.config.index.snippet_radius = radius;
        self
    }

    /// Enable tag-relation edges with the given threshold
    pub fn tag_relations(mut self, min_shared_tags: usize) -> Self {
        self.config.graph.tag_relations = true;
        self.config.graph.min_shared_tags = min_shared_tags;
        self
    }

    pub fn category_relations(mut self, enabled: bool) -> Self {
        self.config.graph.category_relations = enabled;
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.analysis.top_k = top_k;
        self
    }

    pub fn hub_threshold(mut self, threshold: usize) -> Self {
        self.config.analysis.hub_threshold = threshold;
        self
    }

    pub fn bridge_threshold(mut self, threshold: f64) -> Self {
        self.config.analysis.bridge_threshold = threshold;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.analysis.random_seed = Some(seed);
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<WikiGraphConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_builder() {
        let config = WikiGraphConfig::builder("/corpus")
            .tag_relations(3)
            .category_relations(true)
            .random_seed(7)
            .build()
            .unwrap();

        assert!(config.graph.tag_relations);
        assert_eq!(config.graph.min_shared_tags, 3);
        assert!(config.graph.category_relations);
        assert_eq!(config.analysis.random_seed, Some(7));
    }

    #[test]
    fn test_config_validation() {
        assert!(WikiGraphConfig::builder("/corpus").top_k(0).build().is_err());
        assert!(
            WikiGraphConfig::builder("/corpus")
                .extensions([".md"])
                .build()
                .is_err()
        );

        let mut config = WikiGraphConfig::new("/corpus");
        config.analysis.pagerank_damping = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_root() {
        let temp = TempDir::new().unwrap();
        assert!(WikiGraphConfig::new(temp.path()).validate_root().is_ok());
        assert!(
            WikiGraphConfig::new(temp.path().join("missing"))
                .validate_root()
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wikigraph.yaml");

        let config = WikiGraphConfig::builder(temp.path())
            .hub_threshold(3)
            .build()
            .unwrap();
        config.save(&path).await.unwrap();

        let loaded = WikiGraphConfig::load(&path).await.unwrap();
        assert_eq!(loaded.analysis.hub_threshold, 3);
        assert_eq!(loaded.index.extensions, vec!["md".to_string()]);
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.yaml");
        tokio::fs::write(&path, "root: /corpus\ngraph:\n  tag_relations: true\n")
            .await
            .unwrap();

        let loaded = WikiGraphConfig::load(&path).await.unwrap();
        assert!(loaded.graph.tag_relations);
        assert_eq!(loaded.graph.min_shared_tags, 2);
        assert_eq!(loaded.analysis.pagerank_iterations, 50);
        assert_eq!(loaded.log_level, "info");
    }
}
