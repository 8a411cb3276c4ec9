//! Implementation of the `init` command.
//!
//! Creates the `.kgraph/` directory with a default configuration, an empty
//! graph snapshot and a `.gitignore`.

use crate::config::{
    CONFIG_FILE_NAME, GRAPH_FILE_NAME, KGRAPH_DIR_NAME, KgraphConfig, validate_prefix,
};
use crate::error::{ConfigError, Result};
use crate::id_generation::DEFAULT_PREFIX;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Name of the gitignore file within `.kgraph`.
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Result of the init command.
#[derive(Debug)]
pub struct InitResult {
    /// The created `.kgraph` directory.
    pub kgraph_dir: PathBuf,
    /// The created config file.
    pub config_file: PathBuf,
    /// The created (empty) graph snapshot.
    pub graph_file: PathBuf,
    /// The created gitignore file.
    pub gitignore_file: PathBuf,
    /// The id prefix written to the config.
    pub prefix: String,
}

/// Initialize a workspace in `base_dir`.
///
/// `prefix` defaults to `kg` and is trimmed before validation.
///
/// # Errors
///
/// - `ConfigError::AlreadyInitialized` if `.kgraph/` already exists
/// - `ConfigError::InvalidValue` for a bad prefix
/// - `Error::Io` on filesystem failure
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let kgraph_dir = base_dir.join(KGRAPH_DIR_NAME);
    if kgraph_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(base_dir.display().to_string()).into());
    }

    fs::create_dir_all(&kgraph_dir).await?;

    let config_file = kgraph_dir.join(CONFIG_FILE_NAME);
    KgraphConfig::new(prefix).save(&config_file).await?;

    let graph_file = kgraph_dir.join(GRAPH_FILE_NAME);
    fs::write(&graph_file, "").await?;

    let gitignore_file = kgraph_dir.join(GITIGNORE_FILE_NAME);
    fs::write(
        &gitignore_file,
        "# Temporary snapshot files written during save\n*.tmp\n",
    )
    .await?;

    info!(dir = %kgraph_dir.display(), prefix, "Initialized kgraph workspace");

    Ok(InitResult {
        kgraph_dir,
        config_file,
        graph_file,
        gitignore_file,
        prefix: prefix.to_string(),
    })
}

/// Whether `base_dir` itself holds a workspace.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(KGRAPH_DIR_NAME).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_directory_structure() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        assert!(result.kgraph_dir.is_dir());
        assert!(result.config_file.exists());
        assert!(result.graph_file.exists());
        assert!(result.gitignore_file.exists());
        assert_eq!(result.prefix, DEFAULT_PREFIX);
        assert!(is_initialized(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_init_writes_trimmed_prefix() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some("  acme ")).await.unwrap();

        let config = KgraphConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.id_prefix, "acme");
    }

    #[tokio::test]
    async fn test_init_creates_empty_graph_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        let content = tokio::fs::read_to_string(&result.graph_file).await.unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let err = init(temp_dir.path(), None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AlreadyInitialized(_))
        ));
        assert!(err.to_string().contains("already initialized"));
    }

    #[tokio::test]
    async fn test_init_rejects_bad_prefix_before_touching_disk() {
        let temp_dir = TempDir::new().unwrap();

        let err = init(temp_dir.path(), Some("a")).await.unwrap_err();
        assert!(err.to_string().contains("at least 2"));
        assert!(!is_initialized(temp_dir.path()));
    }
}
