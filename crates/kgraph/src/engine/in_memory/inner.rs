//! Core in-memory data structures.
//!
//! This module contains the inner state that is wrapped in
//! `Arc<RwLock<_>>` by [`InMemoryEngine`](super::InMemoryEngine).

use crate::domain::{Edge, EdgeId, Vertex, VertexId};
use crate::engine::Filter;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::HashMap;

/// Inner engine state (not thread-safe).
#[derive(Default)]
pub(crate) struct EngineInner {
    /// The graph. Node weights are vertices, edge weights are edges;
    /// edge direction is `fromVertexId -> toVertexId`.
    pub(super) graph: StableDiGraph<Vertex, Edge>,

    /// Vertex id to node index. Every node in `graph` has an entry.
    pub(super) vertex_index: HashMap<VertexId, NodeIndex>,

    /// Edge id to edge index. Every edge in `graph` has an entry.
    pub(super) edge_index: HashMap<EdgeId, EdgeIndex>,
}

impl EngineInner {
    /// Candidate nodes for a filter, narrowed by a pinned id when present.
    ///
    /// The filter itself is *not* applied.
    pub(super) fn vertex_candidates(&self, filter: &Filter) -> Vec<NodeIndex> {
        match filter.pinned_id() {
            Some(id) => self
                .vertex_index
                .get(&VertexId::from(id))
                .copied()
                .into_iter()
                .collect(),
            None => self.graph.node_indices().collect(),
        }
    }

    /// Candidate edges for a filter, narrowed by a pinned id when present.
    pub(super) fn edge_candidates(&self, filter: &Filter) -> Vec<EdgeIndex> {
        match filter.pinned_id() {
            Some(id) => self
                .edge_index
                .get(&EdgeId::from(id))
                .copied()
                .into_iter()
                .collect(),
            None => self.graph.edge_indices().collect(),
        }
    }

    /// All nodes whose vertex matches `filter`.
    pub(super) fn matching_vertices(&self, filter: &Filter) -> Vec<NodeIndex> {
        self.vertex_candidates(filter)
            .into_iter()
            .filter(|&n| filter.matches(&self.graph[n]))
            .collect()
    }

    /// The first node whose vertex matches `filter`, in id order.
    pub(super) fn first_vertex(&self, filter: &Filter) -> Option<NodeIndex> {
        self.matching_vertices(filter)
            .into_iter()
            .min_by(|&a, &b| self.graph[a].id.cmp(&self.graph[b].id))
    }

    /// Remove a node, its incident edges and their index entries.
    pub(super) fn remove_vertex(&mut self, node: NodeIndex) {
        let incident: Vec<EdgeId> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .chain(self.graph.edges_directed(node, Direction::Incoming))
            .map(|e| e.weight().id.clone())
            .collect();
        for id in incident {
            self.edge_index.remove(&id);
        }
        if let Some(vertex) = self.graph.remove_node(node) {
            self.vertex_index.remove(&vertex.id);
        }
    }

    /// Insert a vertex loaded from a snapshot. Returns `false` on a
    /// duplicate id.
    pub(super) fn insert_vertex(&mut self, vertex: Vertex) -> bool {
        if self.vertex_index.contains_key(&vertex.id) {
            return false;
        }
        let id = vertex.id.clone();
        let node = self.graph.add_node(vertex);
        self.vertex_index.insert(id, node);
        true
    }

    /// Insert an edge loaded from a snapshot, resolving endpoints by id.
    /// Returns `false` when an endpoint is missing or the id is taken.
    pub(super) fn insert_edge(&mut self, edge: Edge) -> bool {
        if self.edge_index.contains_key(&edge.id) {
            return false;
        }
        let (Some(&source), Some(&target)) = (
            self.vertex_index.get(&edge.from_vertex_id),
            self.vertex_index.get(&edge.to_vertex_id),
        ) else {
            return false;
        };
        let id = edge.id.clone();
        let index = self.graph.add_edge(source, target, edge);
        self.edge_index.insert(id, index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{edge, vertex};
    use super::*;
    use crate::domain::EdgeType;

    #[test]
    fn test_remove_vertex_keeps_indexes_consistent() {
        let mut inner = EngineInner::default();
        assert!(inner.insert_vertex(vertex("a", "acme")));
        assert!(inner.insert_vertex(vertex("b", "acme")));
        assert!(inner.insert_edge(edge("e1", "a", "b", EdgeType::Calls)));
        assert!(inner.insert_edge(edge("e2", "b", "a", EdgeType::Uses)));

        let node = inner.vertex_index[&VertexId::new("a")];
        inner.remove_vertex(node);

        assert_eq!(inner.graph.node_count(), 1);
        assert_eq!(inner.graph.edge_count(), 0);
        assert!(inner.edge_index.is_empty());
        assert_eq!(inner.vertex_index.len(), 1);
    }

    #[test]
    fn test_insert_edge_rejects_orphans() {
        let mut inner = EngineInner::default();
        assert!(inner.insert_vertex(vertex("a", "acme")));
        assert!(!inner.insert_edge(edge("e1", "a", "ghost", EdgeType::Calls)));
        assert!(!inner.insert_vertex(vertex("a", "acme")));
    }

    #[test]
    fn test_pinned_filter_uses_index() {
        let mut inner = EngineInner::default();
        inner.insert_vertex(vertex("a", "acme"));
        inner.insert_vertex(vertex("b", "acme"));
        assert_eq!(inner.vertex_candidates(&Filter::id("b")).len(), 1);
        assert_eq!(inner.vertex_candidates(&Filter::Always).len(), 2);
        assert!(inner.vertex_candidates(&Filter::id("zz")).is_empty());
    }
}
