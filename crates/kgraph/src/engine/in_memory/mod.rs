//! In-memory graph engine backed by petgraph.
//!
//! All data is held in RAM. The CLI persists it between invocations with
//! [`load_snapshot`] and [`save_snapshot`], which read and write a JSONL
//! file (one vertex or edge per line).
//!
//! # Architecture
//!
//! - `petgraph::stable_graph::StableDiGraph<Vertex, Edge>` holds the data.
//!   Stable indices survive removals, so traversers can carry raw indices.
//! - `HashMap<VertexId, NodeIndex>` and `HashMap<EdgeId, EdgeIndex>` give
//!   O(1) id lookups. A filter that pins an id (see
//!   [`Filter::pinned_id`](super::Filter::pinned_id)) is answered from the
//!   index instead of a full scan.
//! - Edge direction follows the stored relationship: source is
//!   `fromVertexId`, target is `toVertexId`.
//!
//! # Thread Safety
//!
//! The inner state sits behind `Arc<RwLock<_>>`. Traversals take a read
//! lock for their whole execution; guarded writes take the write lock so
//! the filter check and the mutation are atomic.
//!
//! # Limits
//!
//! Interpretation is breadth-first. A traversal whose live traverser set
//! grows beyond [`MAX_TRAVERSERS`] is aborted with an engine error rather
//! than exhausting memory.

mod exec;
mod inner;
mod snapshot;

pub use exec::MAX_TRAVERSERS;
pub use snapshot::{LoadWarning, load_snapshot, save_snapshot};

use super::{Element, Filter, GraphEngine, GroupKey, Traversal};
use crate::domain::{Edge, Vertex};
use crate::error::{Error, Result};
use async_trait::async_trait;
use inner::EngineInner;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Thread-safe in-memory graph engine.
///
/// Cloning is cheap and yields a handle onto the same graph.
#[derive(Clone, Default)]
pub struct InMemoryEngine {
    inner: Arc<RwLock<EngineInner>>,
}

impl InMemoryEngine {
    /// Create an empty engine.
    ///
    /// # Example
    ///
    /// ```
    /// use kgraph::engine::{GraphEngine, InMemoryEngine, Traversal};
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() -> kgraph::error::Result<()> {
    ///     let engine = InMemoryEngine::new();
    ///     assert_eq!(engine.count(&Traversal::vertices()).await?, 0);
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vertices and edges.
    pub async fn size(&self) -> (usize, usize) {
        let inner = self.inner.read().await;
        (inner.graph.node_count(), inner.graph.edge_count())
    }

    /// Copy out every vertex and edge, each sorted by id.
    pub async fn export(&self) -> (Vec<Vertex>, Vec<Edge>) {
        let inner = self.inner.read().await;
        let mut vertices: Vec<Vertex> = inner.graph.node_weights().cloned().collect();
        let mut edges: Vec<Edge> = inner.graph.edge_weights().cloned().collect();
        vertices.sort_by(|a, b| a.id.cmp(&b.id));
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        (vertices, edges)
    }
}

impl std::fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEngine").finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphEngine for InMemoryEngine {
    async fn to_list(&self, traversal: &Traversal) -> Result<Vec<Element>> {
        let inner = self.inner.read().await;
        let traversers = inner.execute(traversal)?;
        Ok(traversers.iter().map(|t| inner.current(t)).collect())
    }

    async fn count(&self, traversal: &Traversal) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner.execute(traversal)?.len())
    }

    async fn paths(&self, traversal: &Traversal) -> Result<Vec<Vec<Element>>> {
        let inner = self.inner.read().await;
        let traversers = inner.execute(traversal)?;
        Ok(traversers.iter().map(|t| inner.path(t)).collect())
    }

    async fn group_count(
        &self,
        traversal: &Traversal,
        key: &GroupKey,
    ) -> Result<BTreeMap<String, usize>> {
        let inner = self.inner.read().await;
        let traversers = inner.execute(traversal)?;
        let mut groups = BTreeMap::new();
        for traverser in &traversers {
            if let Some(group) = inner.group_key(traverser, key) {
                *groups.entry(group).or_insert(0) += 1;
            }
        }
        Ok(groups)
    }

    async fn add_vertex(&self, vertex: Vertex) -> Result<Vertex> {
        let mut inner = self.inner.write().await;
        if inner.vertex_index.contains_key(&vertex.id) {
            return Err(Error::Engine(format!("vertex {} already exists", vertex.id)));
        }
        let node = inner.graph.add_node(vertex.clone());
        inner.vertex_index.insert(vertex.id.clone(), node);
        debug!(vertex_id = %vertex.id, "Added vertex");
        Ok(vertex)
    }

    async fn set_properties(&self, filter: &Filter, vertex: Vertex) -> Result<Option<Vertex>> {
        let mut inner = self.inner.write().await;
        let Some(&node) = inner.vertex_index.get(&vertex.id) else {
            return Ok(None);
        };
        if !filter.matches(&inner.graph[node]) {
            return Ok(None);
        }
        inner.graph[node] = vertex.clone();
        Ok(Some(vertex))
    }

    async fn add_edge(&self, from: &Filter, to: &Filter, mut edge: Edge) -> Result<Option<Edge>> {
        let mut inner = self.inner.write().await;
        if inner.edge_index.contains_key(&edge.id) {
            return Err(Error::Engine(format!("edge {} already exists", edge.id)));
        }
        let (Some(source), Some(target)) = (inner.first_vertex(from), inner.first_vertex(to))
        else {
            return Ok(None);
        };
        edge.from_vertex_id = inner.graph[source].id.clone();
        edge.to_vertex_id = inner.graph[target].id.clone();
        let index = inner.graph.add_edge(source, target, edge.clone());
        inner.edge_index.insert(edge.id.clone(), index);
        debug!(edge_id = %edge.id, "Added edge");
        Ok(Some(edge))
    }

    async fn drop_vertices(&self, filter: &Filter) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let doomed = inner.matching_vertices(filter);
        for &node in &doomed {
            inner.remove_vertex(node);
        }
        Ok(doomed.len())
    }
}
