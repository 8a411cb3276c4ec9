//! Forward, reverse and circular dependency analysis.

use crate::domain::{EdgeType, Vertex, VertexId};
use crate::engine::Direction;
use crate::error::{Error, Result};
use crate::repository::VertexRepository;
use crate::security::SecurityContext;
use crate::traversal::{PathMode, TraversalEngine, TraversalPath, WalkOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Default walk depth for dependency analysis.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Default cap on paths collected per walk.
pub const DEFAULT_PATH_LIMIT: usize = 1000;

/// Which way to walk dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyDirection {
    /// What the root depends on.
    Forward,
    /// What depends on the root.
    Reverse,
    /// Both.
    #[default]
    Both,
}

impl DependencyDirection {
    fn forward(self) -> bool {
        matches!(self, Self::Forward | Self::Both)
    }

    fn reverse(self) -> bool {
        matches!(self, Self::Reverse | Self::Both)
    }
}

impl FromStr for DependencyDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "out" => Ok(Self::Forward),
            "reverse" | "in" => Ok(Self::Reverse),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "invalid direction '{other}' (expected forward, reverse or both)"
            )),
        }
    }
}

/// A section of a [`DependencyAnalysis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Forward dependencies.
    Forward,
    /// Reverse dependencies.
    Reverse,
    /// Circular dependencies.
    Cycles,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Forward => "forward",
            Section::Reverse => "reverse",
            Section::Cycles => "cycles",
        })
    }
}

/// Parameters for a dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOptions {
    /// Walk direction.
    pub direction: DependencyDirection,
    /// Edge types treated as dependencies.
    pub edge_types: Vec<EdgeType>,
    /// Maximum hop level.
    pub max_depth: usize,
    /// Keep results beyond hop level 1.
    pub include_indirect: bool,
    /// Run cycle detection.
    pub detect_cycles: bool,
    /// Cap on paths collected per walk.
    pub path_limit: usize,
}

impl Default for DependencyOptions {
    fn default() -> Self {
        Self {
            direction: DependencyDirection::Both,
            edge_types: EdgeType::DEPENDENCY.to_vec(),
            max_depth: DEFAULT_MAX_DEPTH,
            include_indirect: true,
            detect_cycles: true,
            path_limit: DEFAULT_PATH_LIMIT,
        }
    }
}

/// One vertex reached by a dependency walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// The dependency (or dependent).
    pub vertex: Vertex,
    /// Hop level at which it was first reached; 1 means direct.
    pub level: usize,
    /// Vertex ids from the root to this vertex, inclusive.
    pub path: Vec<VertexId>,
    /// Type of the edge through which it was reached.
    pub edge_type: EdgeType,
}

/// Summary numbers for a [`DependencyAnalysis`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStats {
    /// Number of forward dependencies.
    pub forward_count: usize,
    /// Number of reverse dependencies.
    pub reverse_count: usize,
    /// Number of distinct cycles.
    pub cycle_count: usize,
    /// Deepest hop level actually observed.
    pub max_depth: usize,
}

/// Result of [`DependencyAnalyzer::analyze`].
///
/// A section is `None` when it was not requested or when its walk failed;
/// failed sections are listed in `failed_sections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAnalysis {
    /// The analyzed vertex.
    pub root: Vertex,
    /// What the root depends on.
    pub forward: Option<Vec<Dependency>>,
    /// What depends on the root.
    pub reverse: Option<Vec<Dependency>>,
    /// Cycles reachable from the root, each as the vertex ids forming it.
    pub cycles: Option<Vec<Vec<VertexId>>>,
    /// Summary numbers.
    pub stats: DependencyStats,
    /// Sections whose walk failed.
    pub failed_sections: Vec<Section>,
}

/// Computes dependency structure around a vertex.
#[derive(Debug, Clone)]
pub struct DependencyAnalyzer {
    vertices: VertexRepository,
    traversal: TraversalEngine,
}

impl DependencyAnalyzer {
    /// Create an analyzer.
    pub fn new(vertices: VertexRepository, traversal: TraversalEngine) -> Self {
        Self {
            vertices,
            traversal,
        }
    }

    /// Analyze the dependencies of `root`.
    ///
    /// The root must be visible to `ctx`. Each requested section runs
    /// concurrently and independently; a failing section is dropped and
    /// recorded rather than failing the analysis.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for a depth of zero or above the traversal
    ///   ceiling
    /// - `Error::NotFound` if the root is missing or invisible
    pub async fn analyze(
        &self,
        ctx: &SecurityContext,
        root: &VertexId,
        options: &DependencyOptions,
    ) -> Result<DependencyAnalysis> {
        self.validate(options)?;
        let root_vertex = self.resolve(ctx, root).await?;

        let forward = async {
            if options.direction.forward() {
                Some(self.walk(ctx, root, Direction::Out, options).await)
            } else {
                None
            }
        };
        let reverse = async {
            if options.direction.reverse() {
                Some(self.walk(ctx, root, Direction::In, options).await)
            } else {
                None
            }
        };
        let cycles = async {
            if options.detect_cycles {
                Some(self.find_cycles(ctx, root, options).await)
            } else {
                None
            }
        };
        let (forward, reverse, cycles) = tokio::join!(forward, reverse, cycles);

        let mut failed_sections = Vec::new();
        let forward = settle(root, Section::Forward, forward, &mut failed_sections);
        let reverse = settle(root, Section::Reverse, reverse, &mut failed_sections);
        let cycles = settle(root, Section::Cycles, cycles, &mut failed_sections);

        let observed_depth = forward
            .iter()
            .chain(reverse.iter())
            .flatten()
            .map(|d| d.level)
            .max()
            .unwrap_or(0);
        let stats = DependencyStats {
            forward_count: forward.as_ref().map_or(0, Vec::len),
            reverse_count: reverse.as_ref().map_or(0, Vec::len),
            cycle_count: cycles.as_ref().map_or(0, Vec::len),
            max_depth: observed_depth,
        };

        debug!(
            tenant = ctx.tenant_id(),
            root = %root,
            forward = stats.forward_count,
            reverse = stats.reverse_count,
            cycles = stats.cycle_count,
            "Analyzed dependencies"
        );

        Ok(DependencyAnalysis {
            root: root_vertex,
            forward,
            reverse,
            cycles,
            stats,
            failed_sections,
        })
    }

    /// What `root` depends on.
    ///
    /// Unlike [`analyze`](Self::analyze), a failed walk is an error.
    pub async fn forward_dependencies(
        &self,
        ctx: &SecurityContext,
        root: &VertexId,
        options: &DependencyOptions,
    ) -> Result<Vec<Dependency>> {
        self.validate(options)?;
        self.resolve(ctx, root).await?;
        self.walk(ctx, root, Direction::Out, options).await
    }

    /// What depends on `root`.
    ///
    /// Unlike [`analyze`](Self::analyze), a failed walk is an error.
    pub async fn reverse_dependencies(
        &self,
        ctx: &SecurityContext,
        root: &VertexId,
        options: &DependencyOptions,
    ) -> Result<Vec<Dependency>> {
        self.validate(options)?;
        self.resolve(ctx, root).await?;
        self.walk(ctx, root, Direction::In, options).await
    }

    /// Cycles reachable from `root` along outgoing dependency edges.
    ///
    /// Each cycle is listed once, rotated so its smallest id comes first.
    pub async fn detect_circular_dependencies(
        &self,
        ctx: &SecurityContext,
        root: &VertexId,
        options: &DependencyOptions,
    ) -> Result<Vec<Vec<VertexId>>> {
        self.validate(options)?;
        self.resolve(ctx, root).await?;
        self.find_cycles(ctx, root, options).await
    }

    /// Resolve `root` through the visibility filter.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the vertex is missing or invisible.
    pub async fn resolve(&self, ctx: &SecurityContext, root: &VertexId) -> Result<Vertex> {
        self.vertices.get(ctx, root).await
    }

    pub(crate) fn validate(&self, options: &DependencyOptions) -> Result<()> {
        if options.max_depth == 0 || options.max_depth > self.traversal.max_depth() {
            return Err(Error::validation(
                "maxDepth",
                format!("must be between 1 and {}", self.traversal.max_depth()),
            ));
        }
        Ok(())
    }

    async fn walk(
        &self,
        ctx: &SecurityContext,
        root: &VertexId,
        direction: Direction,
        options: &DependencyOptions,
    ) -> Result<Vec<Dependency>> {
        let walk = WalkOptions {
            direction,
            edge_types: options.edge_types.clone(),
            max_depth: if options.include_indirect {
                options.max_depth
            } else {
                1
            },
            emit: true,
            mode: PathMode::Simple,
            limit: options.path_limit,
        };
        let paths = self.traversal.walk(ctx, root, &walk).await?;
        Ok(dependencies_from_paths(paths))
    }

    async fn find_cycles(
        &self,
        ctx: &SecurityContext,
        root: &VertexId,
        options: &DependencyOptions,
    ) -> Result<Vec<Vec<VertexId>>> {
        let walk = WalkOptions {
            direction: Direction::Out,
            edge_types: options.edge_types.clone(),
            max_depth: options.max_depth,
            emit: false,
            mode: PathMode::Cyclic,
            limit: options.path_limit,
        };
        let paths = self.traversal.walk(ctx, root, &walk).await?;
        Ok(cycles_from_paths(&paths))
    }
}

/// Turn a section outcome into its reported value, logging failures.
fn settle<T>(
    root: &VertexId,
    section: Section,
    outcome: Option<Result<T>>,
    failed: &mut Vec<Section>,
) -> Option<T> {
    match outcome? {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(root = %root, %section, error = %e, "Dependency section failed, omitting it");
            failed.push(section);
            None
        }
    }
}

/// Preference key among paths reaching the same vertex; smaller wins.
///
/// Shallowest level first, then a hard-coupling final edge, then edge type
/// and path ids, so the choice never depends on edge id order.
fn rank(dependency: &Dependency) -> (usize, bool, EdgeType, &[VertexId]) {
    (
        dependency.level,
        !dependency.edge_type.is_hard_coupling(),
        dependency.edge_type,
        dependency.path.as_slice(),
    )
}

/// Reduce walk paths to one entry per reached vertex, at its shallowest
/// level. Sorted by level, then name, then id.
fn dependencies_from_paths(paths: Vec<TraversalPath>) -> Vec<Dependency> {
    let mut best: BTreeMap<VertexId, Dependency> = BTreeMap::new();
    for path in paths {
        let (Some(vertex), Some(edge)) = (path.last(), path.edges.last()) else {
            continue;
        };
        let dependency = Dependency {
            vertex: vertex.clone(),
            level: path.length(),
            path: path.vertex_ids(),
            edge_type: edge.edge_type,
        };
        if best
            .get(&dependency.vertex.id)
            .is_some_and(|current| rank(current) <= rank(&dependency))
        {
            continue;
        }
        best.insert(dependency.vertex.id.clone(), dependency);
    }

    let mut result: Vec<Dependency> = best.into_values().collect();
    result.sort_by(|a, b| {
        (a.level, &a.vertex.name, &a.vertex.id).cmp(&(b.level, &b.vertex.name, &b.vertex.id))
    });
    result
}

/// Extract distinct cycles from paths that end on a revisited vertex.
fn cycles_from_paths(paths: &[TraversalPath]) -> Vec<Vec<VertexId>> {
    let mut cycles = BTreeSet::new();
    for path in paths {
        let ids = path.vertex_ids();
        let Some(last) = ids.last() else {
            continue;
        };
        let Some(first) = ids.iter().position(|id| id == last) else {
            continue;
        };
        if first + 1 >= ids.len() {
            continue;
        }
        cycles.insert(canonical_cycle(&ids[first..ids.len() - 1]));
    }
    cycles.into_iter().collect()
}

/// Rotate a cycle so its smallest id comes first.
pub(crate) fn canonical_cycle(cycle: &[VertexId]) -> Vec<VertexId> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map_or(0, |(i, _)| i);
    cycle[start..].iter().chain(&cycle[..start]).cloned().collect()
}
