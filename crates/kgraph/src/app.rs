//! Application context for CLI command execution.
//!
//! [`App`] is the composition root: it locates the workspace, loads the
//! configuration and the graph snapshot, and wires one [`GraphClient`]
//! into every repository and analyzer.
//!
//! # Example
//!
//! ```no_run
//! use kgraph::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     // Run operations through app.vertices(), app.dependencies(), ...
//!     app.save().await?;
//!     Ok(())
//! }
//! ```

use crate::analysis::{DependencyAnalyzer, ImpactAnalyzer, PatternDetector};
use crate::config::{CONFIG_FILE_NAME, KGRAPH_DIR_NAME, KgraphConfig, find_workspace_root};
use crate::engine::{GraphClient, InMemoryEngine, LoadWarning, load_snapshot, save_snapshot};
use crate::error::{ConfigError, Result};
use crate::id_generation::IdGenerator;
use crate::repository::{EdgeRepository, VertexRepository};
use crate::traversal::TraversalEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Application context for CLI operations.
pub struct App {
    engine: InMemoryEngine,
    vertices: VertexRepository,
    edges: EdgeRepository,
    traversal: TraversalEngine,
    dependencies: DependencyAnalyzer,
    impact: ImpactAnalyzer,
    patterns: PatternDetector,
    config: KgraphConfig,
    root_dir: PathBuf,
    snapshot_path: PathBuf,
    warnings: Vec<LoadWarning>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root_dir", &self.root_dir)
            .field("snapshot_path", &self.snapshot_path)
            .field("config", &self.config)
            .field("engine", &"<InMemoryEngine>")
            .finish_non_exhaustive()
    }
}

impl App {
    /// Open the workspace containing `working_dir`.
    ///
    /// Walks up to the nearest `.kgraph/`, loads its configuration and
    /// snapshot. Snapshot problems are logged and kept in
    /// [`load_warnings`](Self::load_warnings) rather than failing.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NotInitialized` if no workspace is found
    /// - configuration errors from [`KgraphConfig::load`]
    /// - `Error::Io` if the snapshot cannot be read
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_workspace_root(working_dir).ok_or(ConfigError::NotInitialized)?;
        let config_path = root_dir.join(KGRAPH_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = KgraphConfig::load(&config_path).await?;

        let snapshot_path = config.engine.snapshot_path(&root_dir)?;
        let (engine, warnings) = load_snapshot(&snapshot_path).await?;
        for warning in &warnings {
            warn!(path = %snapshot_path.display(), "{warning}");
        }

        Ok(Self::assemble(engine, config, root_dir, snapshot_path, warnings))
    }

    /// Wire repositories and analyzers around `engine`.
    fn assemble(
        engine: InMemoryEngine,
        config: KgraphConfig,
        root_dir: PathBuf,
        snapshot_path: PathBuf,
        warnings: Vec<LoadWarning>,
    ) -> Self {
        let client = GraphClient::single(Arc::new(engine.clone()));
        let ids = Arc::new(IdGenerator::new(config.id_prefix.clone()));

        let vertices = VertexRepository::new(client.clone(), Arc::clone(&ids));
        let edges = EdgeRepository::new(client.clone(), ids);
        let traversal = TraversalEngine::with_limits(
            client,
            config.traversal.path_limit,
            config.traversal.max_depth,
        );
        let dependencies = DependencyAnalyzer::new(vertices.clone(), traversal.clone());
        let impact = ImpactAnalyzer::new(dependencies.clone());
        let patterns = PatternDetector::new(edges.clone(), dependencies.clone());

        Self {
            engine,
            vertices,
            edges,
            traversal,
            dependencies,
            impact,
            patterns,
            config,
            root_dir,
            snapshot_path,
            warnings,
        }
    }

    /// Vertex repository.
    pub fn vertices(&self) -> &VertexRepository {
        &self.vertices
    }

    /// Edge repository.
    pub fn edges(&self) -> &EdgeRepository {
        &self.edges
    }

    /// Secured traversal engine.
    pub fn traversal(&self) -> &TraversalEngine {
        &self.traversal
    }

    /// Dependency analyzer.
    pub fn dependencies(&self) -> &DependencyAnalyzer {
        &self.dependencies
    }

    /// Impact analyzer.
    pub fn impact(&self) -> &ImpactAnalyzer {
        &self.impact
    }

    /// Pattern detector.
    pub fn patterns(&self) -> &PatternDetector {
        &self.patterns
    }

    /// Loaded configuration.
    pub fn config(&self) -> &KgraphConfig {
        &self.config
    }

    /// Directory containing `.kgraph/`.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Problems found while loading the snapshot.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Vertex and edge counts of the whole graph, across tenants.
    pub async fn size(&self) -> (usize, usize) {
        self.engine.size().await
    }

    /// Persist the graph to the snapshot file.
    ///
    /// Call after every mutating operation.
    pub async fn save(&self) -> Result<()> {
        save_snapshot(&self.engine, &self.snapshot_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use crate::domain::{VertexAttributes, VertexKind};
    use crate::security::SecurityContext;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("test")).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.config().id_prefix, "test");
        assert_eq!(app.root_dir(), temp_dir.path());
        assert!(app.load_warnings().is_empty());
        assert_eq!(app.size().await, (0, 0));
    }

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("proj")).await.unwrap();
        let sub_dir = temp_dir.path().join("src").join("lib");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let app = App::from_directory(&sub_dir).await.unwrap();
        assert_eq!(app.config().id_prefix, "proj");
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a kgraph workspace"));
    }

    #[tokio::test]
    async fn test_saved_vertices_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None).await.unwrap();
        let ctx = SecurityContext::new("acme", "alice").unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();
        let created = app
            .vertices()
            .create_vertex(&ctx, VertexAttributes::new(VertexKind::function(), "parse"))
            .await
            .unwrap();
        assert!(created.id.as_str().starts_with("kg-"));
        app.save().await.unwrap();

        let reopened = App::from_directory(temp_dir.path()).await.unwrap();
        let found = reopened.vertices().find_by_id(&ctx, &created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_lines_become_warnings() {
        let temp_dir = TempDir::new().unwrap();
        let result = init::init(temp_dir.path(), None).await.unwrap();
        tokio::fs::write(&result.graph_file, "not json\n").await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();
        assert_eq!(app.load_warnings().len(), 1);
    }
}
