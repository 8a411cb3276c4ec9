//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use kgraph::analysis::{DependencyAnalyzer, ImpactAnalyzer, PatternDetector};
use kgraph::domain::{
    EdgeType, Vertex, VertexAttributes, VertexId, VertexKind, Visibility,
};
use kgraph::engine::{
    Direction, Element, Filter, GraphClient, GraphEngine, GroupKey, InMemoryEngine, Step,
    Traversal,
};
use kgraph::error::{Error, Result};
use kgraph::id_generation::IdGenerator;
use kgraph::repository::{EdgeRepository, VertexRepository};
use kgraph::security::SecurityContext;
use kgraph::traversal::TraversalEngine;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Every repository and analyzer wired onto one client.
pub struct Fixture {
    pub vertices: VertexRepository,
    pub edges: EdgeRepository,
    pub traversal: TraversalEngine,
    pub dependencies: DependencyAnalyzer,
    pub impact: ImpactAnalyzer,
    pub patterns: PatternDetector,
}

impl Fixture {
    /// Fixture over a fresh in-memory engine.
    pub fn new() -> Self {
        Self::with_engine(Arc::new(InMemoryEngine::new()))
    }

    /// Fixture over an arbitrary engine.
    pub fn with_engine(engine: Arc<dyn GraphEngine>) -> Self {
        let client = GraphClient::single(engine);
        let ids = Arc::new(IdGenerator::default());
        let vertices = VertexRepository::new(client.clone(), Arc::clone(&ids));
        let edges = EdgeRepository::new(client.clone(), ids);
        let traversal = TraversalEngine::new(client);
        let dependencies = DependencyAnalyzer::new(vertices.clone(), traversal.clone());
        let impact = ImpactAnalyzer::new(dependencies.clone());
        let patterns = PatternDetector::new(edges.clone(), dependencies.clone());
        Self {
            vertices,
            edges,
            traversal,
            dependencies,
            impact,
            patterns,
        }
    }

    /// Create a function vertex with the given visibility.
    pub async fn function(
        &self,
        ctx: &SecurityContext,
        name: &str,
        visibility: Visibility,
    ) -> Vertex {
        self.vertices
            .create_vertex(
                ctx,
                VertexAttributes::new(VertexKind::function(), name).with_visibility(visibility),
            )
            .await
            .unwrap()
    }

    /// Create an organization-visible function vertex and return its id.
    pub async fn shared_function(&self, ctx: &SecurityContext, name: &str) -> VertexId {
        self.function(ctx, name, Visibility::Organization).await.id
    }

    /// Link `from -> to` with `edge_type`.
    pub async fn link(
        &self,
        ctx: &SecurityContext,
        from: &VertexId,
        to: &VertexId,
        edge_type: EdgeType,
    ) {
        self.edges
            .create_edge(ctx, from, to, edge_type.into())
            .await
            .unwrap();
    }
}

/// A context in tenant `acme`.
pub fn user(user_id: &str) -> SecurityContext {
    SecurityContext::new("acme", user_id).unwrap()
}

/// Whether any repeat loop in `traversal` walks edges in `direction`.
pub fn repeats_in(traversal: &Traversal, direction: Direction) -> bool {
    traversal.steps().iter().any(|step| match step {
        Step::Repeat(repeat) => repeat.body.iter().any(|inner| {
            matches!(inner, Step::Vertex { direction: d, .. } if *d == direction)
        }),
        _ => false,
    })
}

/// Whether `traversal` is a cycle search.
pub fn is_cycle_search(traversal: &Traversal) -> bool {
    traversal
        .steps()
        .iter()
        .any(|step| matches!(step, Step::Repeat(repeat) if repeat.until_cyclic))
}

/// Engine double that delegates to an in-memory engine but fails every
/// read whose traversal matches a predicate.
pub struct FailingEngine {
    inner: InMemoryEngine,
    fails: fn(&Traversal) -> bool,
    failures: AtomicUsize,
}

impl FailingEngine {
    pub fn new(fails: fn(&Traversal) -> bool) -> Self {
        Self {
            inner: InMemoryEngine::new(),
            fails,
            failures: AtomicUsize::new(0),
        }
    }

    /// Number of reads that were failed so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn check(&self, traversal: &Traversal) -> Result<()> {
        if (self.fails)(traversal) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(Error::Engine("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphEngine for FailingEngine {
    async fn to_list(&self, traversal: &Traversal) -> Result<Vec<Element>> {
        self.check(traversal)?;
        self.inner.to_list(traversal).await
    }

    async fn count(&self, traversal: &Traversal) -> Result<usize> {
        self.check(traversal)?;
        self.inner.count(traversal).await
    }

    async fn paths(&self, traversal: &Traversal) -> Result<Vec<Vec<Element>>> {
        self.check(traversal)?;
        self.inner.paths(traversal).await
    }

    async fn group_count(
        &self,
        traversal: &Traversal,
        key: &GroupKey,
    ) -> Result<BTreeMap<String, usize>> {
        self.check(traversal)?;
        self.inner.group_count(traversal, key).await
    }

    async fn add_vertex(&self, vertex: Vertex) -> Result<Vertex> {
        self.inner.add_vertex(vertex).await
    }

    async fn set_properties(&self, filter: &Filter, vertex: Vertex) -> Result<Option<Vertex>> {
        self.inner.set_properties(filter, vertex).await
    }

    async fn add_edge(
        &self,
        from: &Filter,
        to: &Filter,
        edge: kgraph::domain::Edge,
    ) -> Result<Option<kgraph::domain::Edge>> {
        self.inner.add_edge(from, to, edge).await
    }

    async fn drop_vertices(&self, filter: &Filter) -> Result<usize> {
        self.inner.drop_vertices(filter).await
    }
}
