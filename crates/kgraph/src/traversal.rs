//! Secured multi-hop traversal.
//!
//! Every hop re-applies the caller's visibility predicate, so a path can
//! never pass through a vertex the caller cannot see, even as an
//! intermediate step. The analyzers in [`crate::analysis`] are built on
//! [`TraversalEngine::walk`].

use crate::domain::{Edge, EdgeType, GraphPath, PathElement, Vertex, VertexId};
use crate::engine::{Direction, Element, GraphClient, Traversal};
use crate::error::{Error, Result};
use crate::repository::visible_vertex_filter;
use crate::security::{SecurityContext, visibility_predicate};
use serde::Serialize;
use tracing::debug;

/// Default cap on the number of paths a traversal returns.
pub const DEFAULT_PATH_LIMIT: usize = 100;

/// Default ceiling on requested traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A traversal result split into its vertex and edge positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalPath {
    /// Vertices in path order, starting with the start vertex.
    pub vertices: Vec<Vertex>,
    /// Edges in path order; `edges[i]` joins `vertices[i]` and
    /// `vertices[i + 1]`.
    pub edges: Vec<Edge>,
}

impl TraversalPath {
    fn from_elements(elements: Vec<Element>) -> Self {
        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        for element in elements {
            match element {
                Element::Vertex(v) => vertices.push(v),
                Element::Edge(e) => edges.push(e),
            }
        }
        Self { vertices, edges }
    }

    /// Number of edges traversed.
    pub fn length(&self) -> usize {
        self.edges.len()
    }

    /// The vertex the path ends on.
    pub fn last(&self) -> Option<&Vertex> {
        self.vertices.last()
    }

    /// Vertex ids in path order.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.iter().map(|v| v.id.clone()).collect()
    }

    /// The alternating id sequence of this path.
    pub fn to_graph_path(&self) -> GraphPath {
        let mut elements = Vec::with_capacity(self.vertices.len() + self.edges.len());
        for (i, vertex) in self.vertices.iter().enumerate() {
            elements.push(PathElement::Vertex(vertex.id.clone()));
            if let Some(edge) = self.edges.get(i) {
                elements.push(PathElement::Edge(edge.id.clone()));
            }
        }
        GraphPath { elements }
    }
}

/// How a walk treats revisited vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    /// Discard any path that revisits a vertex.
    #[default]
    Simple,
    /// Stop a path as soon as it revisits a vertex and return only such
    /// paths.
    Cyclic,
}

/// Parameters for [`TraversalEngine::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Direction to follow edges in.
    pub direction: Direction,
    /// Edge types to follow; empty means all.
    pub edge_types: Vec<EdgeType>,
    /// Maximum number of hops.
    pub max_depth: usize,
    /// Return a path for every hop level, not only the deepest.
    pub emit: bool,
    /// Revisit handling.
    pub mode: PathMode,
    /// Maximum number of paths returned.
    pub limit: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Out,
            edge_types: Vec::new(),
            max_depth: 1,
            emit: true,
            mode: PathMode::Simple,
            limit: DEFAULT_PATH_LIMIT,
        }
    }
}

/// Executes secured traversals.
#[derive(Debug, Clone)]
pub struct TraversalEngine {
    client: GraphClient,
    path_limit: usize,
    max_depth: usize,
}

impl TraversalEngine {
    /// Create an engine with the default path limit and depth ceiling.
    pub fn new(client: GraphClient) -> Self {
        Self::with_limits(client, DEFAULT_PATH_LIMIT, DEFAULT_MAX_DEPTH)
    }

    /// Create an engine with explicit limits.
    pub fn with_limits(client: GraphClient, path_limit: usize, max_depth: usize) -> Self {
        Self {
            client,
            path_limit: path_limit.max(1),
            max_depth,
        }
    }

    /// The configured depth ceiling.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Walk exactly `depth` hops from `start` along `edge_types` (all types
    /// when empty), in either direction.
    ///
    /// Paths never revisit a vertex. At most the configured path limit is
    /// returned. `depth == 0` yields the start vertex alone. An invisible
    /// or missing start vertex yields an empty result.
    ///
    /// # Errors
    ///
    /// `Error::Validation` if `depth` exceeds the depth ceiling,
    /// `Error::Engine` on engine failure.
    pub async fn traverse_graph(
        &self,
        ctx: &SecurityContext,
        start: &VertexId,
        depth: usize,
        edge_types: &[EdgeType],
    ) -> Result<Vec<TraversalPath>> {
        let options = WalkOptions {
            direction: Direction::Both,
            edge_types: edge_types.to_vec(),
            max_depth: depth,
            emit: false,
            mode: PathMode::Simple,
            limit: self.path_limit,
        };
        self.walk(ctx, start, &options).await
    }

    /// General secured walk from `start`.
    ///
    /// # Errors
    ///
    /// `Error::Validation` if `options.max_depth` exceeds the depth
    /// ceiling, `Error::Engine` on engine failure.
    pub async fn walk(
        &self,
        ctx: &SecurityContext,
        start: &VertexId,
        options: &WalkOptions,
    ) -> Result<Vec<TraversalPath>> {
        if options.max_depth > self.max_depth {
            return Err(Error::validation(
                "depth",
                format!("must be at most {}", self.max_depth),
            ));
        }

        let mut hop = Traversal::anonymous()
            .to(options.direction, options.edge_types.iter().copied())
            .has(visibility_predicate(ctx));
        if options.mode == PathMode::Simple {
            hop = hop.simple_path();
        }

        let mut traversal = Traversal::vertices()
            .has(visible_vertex_filter(ctx, start))
            .repeat(
                hop,
                options.max_depth,
                options.emit,
                options.mode == PathMode::Cyclic,
            );
        if options.mode == PathMode::Cyclic {
            traversal = traversal.cyclic_path();
        }
        let traversal = traversal.limit(options.limit);

        let paths: Vec<TraversalPath> = self
            .client
            .reader()
            .paths(&traversal)
            .await?
            .into_iter()
            .map(TraversalPath::from_elements)
            .collect();

        debug!(
            tenant = ctx.tenant_id(),
            start = %start,
            depth = options.max_depth,
            direction = ?options.direction,
            paths = paths.len(),
            "Walked graph"
        );
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{VertexAttributes, VertexKind, Visibility};
    use crate::engine::InMemoryEngine;
    use crate::id_generation::IdGenerator;
    use crate::repository::{EdgeRepository, VertexRepository};
    use std::sync::Arc;

    struct Graph {
        vertices: VertexRepository,
        edges: EdgeRepository,
        engine: TraversalEngine,
    }

    fn graph() -> Graph {
        let client = GraphClient::single(Arc::new(InMemoryEngine::new()));
        let ids = Arc::new(IdGenerator::default());
        Graph {
            vertices: VertexRepository::new(client.clone(), Arc::clone(&ids)),
            edges: EdgeRepository::new(client.clone(), ids),
            engine: TraversalEngine::new(client),
        }
    }

    async fn vertex(g: &Graph, ctx: &SecurityContext, name: &str) -> VertexId {
        g.vertices
            .create_vertex(
                ctx,
                VertexAttributes::new(VertexKind::function(), name)
                    .with_visibility(Visibility::Organization),
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_depth_zero_returns_start_only() {
        let g = graph();
        let ctx = SecurityContext::new("acme", "u1").unwrap();
        let a = vertex(&g, &ctx, "a").await;
        let b = vertex(&g, &ctx, "b").await;
        g.edges.create_edge(&ctx, &a, &b, EdgeType::Calls.into()).await.unwrap();

        let paths = g.engine.traverse_graph(&ctx, &a, 0, &[]).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].vertices.len(), 1);
        assert!(paths[0].edges.is_empty());
    }

    #[tokio::test]
    async fn test_traverse_follows_both_directions_for_exact_depth() {
        let g = graph();
        let ctx = SecurityContext::new("acme", "u1").unwrap();
        let a = vertex(&g, &ctx, "a").await;
        let b = vertex(&g, &ctx, "b").await;
        let c = vertex(&g, &ctx, "c").await;
        g.edges.create_edge(&ctx, &a, &b, EdgeType::Calls.into()).await.unwrap();
        g.edges.create_edge(&ctx, &c, &b, EdgeType::Calls.into()).await.unwrap();

        let paths = g.engine.traverse_graph(&ctx, &a, 2, &[]).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].vertex_ids(), vec![a, b, c]);
        assert_eq!(paths[0].to_graph_path().length(), 2);
    }

    #[tokio::test]
    async fn test_invisible_start_yields_empty() {
        let g = graph();
        let owner = SecurityContext::new("acme", "u1").unwrap();
        let other = SecurityContext::new("acme", "u2").unwrap();
        let secret = g
            .vertices
            .create_vertex(&owner, VertexAttributes::new(VertexKind::function(), "s"))
            .await
            .unwrap();
        let paths = g.engine.traverse_graph(&other, &secret.id, 1, &[]).await.unwrap();
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn test_depth_above_ceiling_is_rejected() {
        let g = graph();
        let ctx = SecurityContext::new("acme", "u1").unwrap();
        let err = g
            .engine
            .traverse_graph(&ctx, &VertexId::new("x"), DEFAULT_MAX_DEPTH + 1, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "depth", .. }));
    }

    #[test]
    fn test_graph_path_alternates() {
        let path = TraversalPath {
            vertices: Vec::new(),
            edges: Vec::new(),
        };
        assert!(path.to_graph_path().elements.is_empty());
        assert!(path.last().is_none());
    }
}
