//! The graph engine boundary.
//!
//! Everything above this module talks to the graph through the
//! [`GraphEngine`] trait: traversals are described as data
//! ([`Traversal`], [`Filter`]) and shipped to the engine, which executes
//! them and hands back owned [`Element`]s. The trait is object-safe so
//! callers hold an `Arc<dyn GraphEngine>`.
//!
//! Two backends exist:
//!
//! - [`InMemoryEngine`]: a petgraph-backed engine with optional JSONL
//!   snapshots, used by the CLI and the test suite.
//! - Test doubles implementing the trait directly (see `tests/common`).
//!
//! # Read and write handles
//!
//! [`GraphClient`] bundles a reader and a writer handle. Both may point at
//! the same engine ([`GraphClient::single`]) or at different replicas.
//! Repositories route every query through the reader and every mutation
//! through the writer.

mod filter;
pub mod in_memory;
mod traversal;

pub use filter::{Filter, PropertySource};
pub use in_memory::{InMemoryEngine, LoadWarning, load_snapshot, save_snapshot};
pub use traversal::{Direction, Endpoint, GroupKey, Repeat, Source, Step, Traversal};

use crate::domain::{Edge, PropertyValue, Vertex};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An element produced by a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A vertex.
    Vertex(Vertex),
    /// An edge.
    Edge(Edge),
}

impl Element {
    /// The element's id as a string.
    pub fn id(&self) -> &str {
        match self {
            Element::Vertex(v) => v.id.as_str(),
            Element::Edge(e) => e.id.as_str(),
        }
    }

    /// Borrow as a vertex.
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Element::Vertex(v) => Some(v),
            Element::Edge(_) => None,
        }
    }

    /// Borrow as an edge.
    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Element::Edge(e) => Some(e),
            Element::Vertex(_) => None,
        }
    }

    /// Convert into a vertex.
    pub fn into_vertex(self) -> Option<Vertex> {
        match self {
            Element::Vertex(v) => Some(v),
            Element::Edge(_) => None,
        }
    }

    /// Convert into an edge.
    pub fn into_edge(self) -> Option<Edge> {
        match self {
            Element::Edge(e) => Some(e),
            Element::Vertex(_) => None,
        }
    }
}

impl PropertySource for Element {
    fn property(&self, key: &str) -> Option<PropertyValue> {
        match self {
            Element::Vertex(v) => v.property(key),
            Element::Edge(e) => e.property(key),
        }
    }
}

/// A graph engine that executes traversals and guarded writes.
///
/// Implementations must be safe to share across tasks. Every method is a
/// single round-trip; this trait makes no promise of atomicity *across*
/// calls.
///
/// # Errors
///
/// Transport and execution failures are reported as
/// [`Error::Engine`](crate::error::Error::Engine).
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Execute a traversal and return the element each traverser ends on.
    async fn to_list(&self, traversal: &Traversal) -> Result<Vec<Element>>;

    /// Execute a traversal and count the traversers.
    async fn count(&self, traversal: &Traversal) -> Result<usize>;

    /// Execute a traversal and return each traverser's full path.
    async fn paths(&self, traversal: &Traversal) -> Result<Vec<Vec<Element>>>;

    /// Execute a traversal and count traversers grouped by `key`.
    async fn group_count(
        &self,
        traversal: &Traversal,
        key: &GroupKey,
    ) -> Result<BTreeMap<String, usize>>;

    /// Insert a vertex. Fails if a vertex with the same id exists.
    async fn add_vertex(&self, vertex: Vertex) -> Result<Vertex>;

    /// Replace the stored vertex with the same id as `vertex`, but only if
    /// the stored vertex matches `filter`.
    ///
    /// Returns `None` when no matching vertex exists; the match and the
    /// write happen atomically.
    async fn set_properties(&self, filter: &Filter, vertex: Vertex) -> Result<Option<Vertex>>;

    /// Insert an edge between the first vertices matching `from` and `to`.
    ///
    /// Returns `None` when either endpoint filter matches nothing.
    async fn add_edge(&self, from: &Filter, to: &Filter, edge: Edge) -> Result<Option<Edge>>;

    /// Remove every vertex matching `filter` together with its incident
    /// edges, returning how many vertices were removed.
    async fn drop_vertices(&self, filter: &Filter) -> Result<usize>;
}

/// Reader and writer handles onto the graph.
#[derive(Clone)]
pub struct GraphClient {
    reader: Arc<dyn GraphEngine>,
    writer: Arc<dyn GraphEngine>,
}

impl GraphClient {
    /// Use distinct engines for reads and writes.
    pub fn new(reader: Arc<dyn GraphEngine>, writer: Arc<dyn GraphEngine>) -> Self {
        Self { reader, writer }
    }

    /// Use one engine for both reads and writes.
    pub fn single(engine: Arc<dyn GraphEngine>) -> Self {
        Self {
            reader: Arc::clone(&engine),
            writer: engine,
        }
    }

    /// The read handle.
    pub fn reader(&self) -> &dyn GraphEngine {
        self.reader.as_ref()
    }

    /// The write handle.
    pub fn writer(&self) -> &dyn GraphEngine {
        self.writer.as_ref()
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("shared", &Arc::ptr_eq(&self.reader, &self.writer))
            .finish()
    }
}
