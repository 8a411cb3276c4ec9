//! Workspace configuration.
//!
//! A kgraph workspace is a directory containing `.kgraph/config.yaml`.
//! Every section has serde defaults, so a partial file loads and an empty
//! file yields [`KgraphConfig::default`].

use crate::analysis::PatternOptions;
use crate::error::{ConfigError, Result};
use crate::id_generation::DEFAULT_PREFIX;
use crate::traversal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the workspace directory.
pub const KGRAPH_DIR_NAME: &str = ".kgraph";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the graph snapshot file.
pub const GRAPH_FILE_NAME: &str = "graph.jsonl";

/// Minimum id prefix length.
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum id prefix length.
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to walk up when searching for a workspace.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// The only supported engine backend.
pub const MEMORY_BACKEND: &str = "memory";

/// Contents of `.kgraph/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KgraphConfig {
    /// Prefix for synthesized ids.
    #[serde(rename = "id-prefix")]
    pub id_prefix: String,

    /// Engine backend.
    pub engine: EngineConfig,

    /// Traversal limits.
    pub traversal: TraversalConfig,

    /// Dependency and impact analysis defaults.
    pub analysis: AnalysisConfig,

    /// Pattern detection thresholds.
    pub patterns: PatternsConfig,
}

/// Engine section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend type; only `memory` (in-memory with JSONL snapshot).
    pub backend: String,

    /// Snapshot path, relative to the workspace root.
    pub data_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: MEMORY_BACKEND.to_string(),
            data_file: format!("{KGRAPH_DIR_NAME}/{GRAPH_FILE_NAME}"),
        }
    }
}

impl EngineConfig {
    /// Absolute snapshot path for a workspace rooted at `root`.
    ///
    /// # Errors
    ///
    /// `ConfigError::UnsupportedBackend` for anything but `memory`.
    pub fn snapshot_path(&self, root: &Path) -> Result<PathBuf> {
        if self.backend != MEMORY_BACKEND {
            return Err(ConfigError::UnsupportedBackend(self.backend.clone()).into());
        }
        Ok(root.join(&self.data_file))
    }
}

/// Traversal section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraversalConfig {
    /// Maximum paths returned by one traversal.
    pub path_limit: usize,

    /// Ceiling on requested depth.
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            path_limit: traversal::DEFAULT_PATH_LIMIT,
            max_depth: traversal::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Analysis section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Depth used when a command does not ask for one.
    pub default_max_depth: usize,

    /// Cap on paths collected per dependency or cycle walk.
    pub cycle_path_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_max_depth: crate::analysis::dependency::DEFAULT_MAX_DEPTH,
            cycle_path_limit: crate::analysis::dependency::DEFAULT_PATH_LIMIT,
        }
    }
}

/// Patterns section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternsConfig {
    /// Minimum in+out degree for a hub.
    pub hub_degree: usize,

    /// Minimum fan-out for a god object.
    pub god_object_fan_out: usize,

    /// Minimum fan-out relative to the mean.
    pub god_object_ratio: f64,

    /// Minimum hop length for a deep chain.
    pub deep_chain_length: usize,

    /// Minimum confidence to report.
    pub similarity_threshold: f64,

    /// Maximum number of patterns reported.
    pub limit: usize,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        let defaults = PatternOptions::default();
        Self {
            hub_degree: defaults.hub_degree,
            god_object_fan_out: defaults.god_object_fan_out,
            god_object_ratio: defaults.god_object_ratio,
            deep_chain_length: defaults.deep_chain_length,
            similarity_threshold: defaults.similarity_threshold,
            limit: defaults.limit,
        }
    }
}

impl Default for KgraphConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KgraphConfig {
    /// Default configuration with the given id prefix.
    pub fn new(prefix: &str) -> Self {
        Self {
            id_prefix: prefix.to_string(),
            engine: EngineConfig::default(),
            traversal: TraversalConfig::default(),
            analysis: AnalysisConfig::default(),
            patterns: PatternsConfig::default(),
        }
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// `Error::Io` if the file cannot be read, `ConfigError::Parse` for
    /// malformed YAML and `ConfigError::InvalidValue` for out-of-range
    /// values.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as YAML.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.id_prefix)?;
        if self.engine.backend != MEMORY_BACKEND {
            return Err(ConfigError::UnsupportedBackend(self.engine.backend.clone()).into());
        }
        if self.traversal.max_depth == 0 {
            return Err(invalid("traversal.max_depth", "must be at least 1"));
        }
        if self.traversal.path_limit == 0 {
            return Err(invalid("traversal.path_limit", "must be at least 1"));
        }
        if self.analysis.default_max_depth == 0
            || self.analysis.default_max_depth > self.traversal.max_depth
        {
            return Err(invalid(
                "analysis.default_max_depth",
                format!("must be between 1 and {}", self.traversal.max_depth),
            ));
        }
        if !(0.0..=1.0).contains(&self.patterns.similarity_threshold) {
            return Err(invalid(
                "patterns.similarity_threshold",
                "must be between 0 and 1",
            ));
        }
        if self.patterns.god_object_ratio <= 0.0 {
            return Err(invalid("patterns.god_object_ratio", "must be positive"));
        }
        if self.patterns.deep_chain_length == 0
            || self.patterns.deep_chain_length > self.traversal.max_depth
        {
            return Err(invalid(
                "patterns.deep_chain_length",
                format!("must be between 1 and {}", self.traversal.max_depth),
            ));
        }
        Ok(())
    }

    /// Pattern detector options derived from this configuration.
    pub fn pattern_options(&self) -> PatternOptions {
        PatternOptions {
            hub_degree: self.patterns.hub_degree,
            god_object_fan_out: self.patterns.god_object_fan_out,
            god_object_ratio: self.patterns.god_object_ratio,
            deep_chain_length: self.patterns.deep_chain_length,
            cycle_depth: self.analysis.default_max_depth,
            cycle_path_limit: self.analysis.cycle_path_limit,
            similarity_threshold: self.patterns.similarity_threshold,
            limit: self.patterns.limit,
            ..PatternOptions::default()
        }
    }
}

fn invalid(key: &'static str, message: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        key,
        message: message.into(),
    }
    .into()
}

/// Validate an id prefix: 2-20 ASCII alphanumerics.
///
/// Expects pre-trimmed input.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(invalid(
            "id-prefix",
            format!("must be at least {MIN_PREFIX_LENGTH} characters"),
        ));
    }
    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(invalid(
            "id-prefix",
            format!("cannot exceed {MAX_PREFIX_LENGTH} characters"),
        ));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid(
            "id-prefix",
            "must contain only alphanumeric characters",
        ));
    }
    Ok(())
}

/// Find the workspace root by walking up from `start_dir`.
///
/// Returns the directory containing `.kgraph/`, or `None` when the
/// filesystem root or [`MAX_TRAVERSAL_DEPTH`] is reached first.
pub fn find_workspace_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(KGRAPH_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
