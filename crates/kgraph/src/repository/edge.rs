//! Edge creation and lookup.
//!
//! Edges never widen access: creating one requires that the caller can see
//! both endpoints, and lookups only return edges whose far endpoint is
//! also visible.

use super::{fetch_visible, visible_vertex_filter};
use crate::domain::{
    Edge, EdgeAttributes, EdgeType, Vertex, VertexFilter, VertexId, keys,
};
use crate::engine::{Direction, Element, Filter, GraphClient, GroupKey, Traversal};
use crate::error::{Error, Operation, Result};
use crate::id_generation::IdGenerator;
use crate::security::{SecurityContext, tenant_predicate, visibility_predicate};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// In/out degree of a vertex, counted through visible neighbours only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Degree {
    /// The vertex.
    pub vertex: Vertex,
    /// Number of visible incoming edges.
    pub in_degree: usize,
    /// Number of visible outgoing edges.
    pub out_degree: usize,
}

impl Degree {
    /// `in_degree + out_degree`.
    pub fn total(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

/// Repository for edges.
#[derive(Debug, Clone)]
pub struct EdgeRepository {
    client: GraphClient,
    ids: Arc<IdGenerator>,
}

impl EdgeRepository {
    /// Create a repository over `client`, synthesizing ids with `ids`.
    pub fn new(client: GraphClient, ids: Arc<IdGenerator>) -> Self {
        Self { client, ids }
    }

    /// Create an edge from `from` to `to`.
    ///
    /// Both endpoints are checked for visibility concurrently; if either
    /// check fails the edge is not created and the error does not say
    /// which endpoint was refused. Tenant, creator and timestamps are
    /// stamped from `ctx`. Without an explicit visibility the edge takes
    /// the more restrictive visibility of its endpoints.
    ///
    /// The insert itself is guarded by the same visibility filter, but the
    /// endpoint checks and the insert are separate round-trips.
    ///
    /// # Errors
    ///
    /// `Error::InsufficientPermissions` (operation `CreateEdge`) if either
    /// endpoint is missing or invisible; `Error::Engine` on engine failure.
    pub async fn create_edge(
        &self,
        ctx: &SecurityContext,
        from: &VertexId,
        to: &VertexId,
        attrs: EdgeAttributes,
    ) -> Result<Edge> {
        let reader = self.client.reader();
        let (source, target) = tokio::try_join!(
            fetch_visible(reader, ctx, from),
            fetch_visible(reader, ctx, to)
        )?;
        let (Some(source), Some(target)) = (source, target) else {
            warn!(
                tenant = ctx.tenant_id(),
                user = ctx.user_id(),
                edge_type = %attrs.edge_type,
                "Edge creation denied"
            );
            return Err(Error::denied(Operation::CreateEdge));
        };

        let now = Utc::now();
        let visibility = attrs
            .visibility
            .unwrap_or_else(|| source.visibility.most_restrictive(target.visibility));
        let edge = Edge {
            id: self
                .ids
                .edge_id(ctx.tenant_id(), &source.id, &target.id, attrs.edge_type),
            edge_type: attrs.edge_type,
            from_vertex_id: source.id.clone(),
            to_vertex_id: target.id.clone(),
            tenant_id: ctx.tenant_id().to_string(),
            user_id: ctx.user_id().to_string(),
            visibility,
            created_at: now,
            updated_at: now,
            metadata: attrs.metadata,
        };

        let inserted = self
            .client
            .writer()
            .add_edge(
                &visible_vertex_filter(ctx, from),
                &visible_vertex_filter(ctx, to),
                edge,
            )
            .await?;
        let Some(edge) = inserted else {
            warn!(
                tenant = ctx.tenant_id(),
                user = ctx.user_id(),
                "Edge creation denied at insert"
            );
            return Err(Error::denied(Operation::CreateEdge));
        };

        debug!(
            tenant = ctx.tenant_id(),
            edge_id = %edge.id,
            edge_type = %edge.edge_type,
            from = %edge.from_vertex_id,
            to = %edge.to_vertex_id,
            "Created edge"
        );
        Ok(edge)
    }

    /// Outgoing edges of a vertex, optionally of one type.
    ///
    /// Returns an empty list if the caller cannot see `vertex_id`.
    pub async fn find_edges_from(
        &self,
        ctx: &SecurityContext,
        vertex_id: &VertexId,
        edge_type: Option<EdgeType>,
    ) -> Result<Vec<Edge>> {
        self.incident_edges(ctx, vertex_id, edge_type, Direction::Out)
            .await
    }

    /// Incoming edges of a vertex, optionally of one type.
    ///
    /// Returns an empty list if the caller cannot see `vertex_id`.
    pub async fn find_edges_to(
        &self,
        ctx: &SecurityContext,
        vertex_id: &VertexId,
        edge_type: Option<EdgeType>,
    ) -> Result<Vec<Edge>> {
        self.incident_edges(ctx, vertex_id, edge_type, Direction::In)
            .await
    }

    async fn incident_edges(
        &self,
        ctx: &SecurityContext,
        vertex_id: &VertexId,
        edge_type: Option<EdgeType>,
        direction: Direction,
    ) -> Result<Vec<Edge>> {
        let reader = self.client.reader();
        if fetch_visible(reader, ctx, vertex_id).await?.is_none() {
            debug!(vertex_id = %vertex_id, "Edge lookup on invisible vertex");
            return Ok(Vec::new());
        }

        let start = Traversal::vertices().has(visible_vertex_filter(ctx, vertex_id));
        let traversal = match direction {
            Direction::In => start.in_e(edge_type).has(tenant_predicate(ctx)).out_v(),
            _ => start.out_e(edge_type).has(tenant_predicate(ctx)).in_v(),
        }
        .has(visibility_predicate(ctx));

        // Paths are [vertex, edge, far vertex].
        let paths = reader.paths(&traversal).await?;
        Ok(paths
            .into_iter()
            .filter_map(|path| path.into_iter().nth(1).and_then(Element::into_edge))
            .collect())
    }

    /// Degree of every visible vertex in `scope`.
    ///
    /// Only edges of `edge_types` (all types when empty) leading to a
    /// visible neighbour are counted. Results are sorted by vertex id.
    pub async fn degrees(
        &self,
        ctx: &SecurityContext,
        scope: &VertexFilter,
        edge_types: &[EdgeType],
    ) -> Result<Vec<Degree>> {
        let visible = visibility_predicate(ctx);
        let origin = Traversal::vertices().has(visible.clone().and(scope_filter(scope)));
        let outgoing = origin
            .clone()
            .to(Direction::Out, edge_types.iter().copied())
            .has(visible.clone());
        let incoming = origin
            .clone()
            .to(Direction::In, edge_types.iter().copied())
            .has(visible);

        let reader = self.client.reader();
        let (vertices, out_counts, in_counts) = tokio::try_join!(
            reader.to_list(&origin),
            reader.group_count(&outgoing, &GroupKey::Origin),
            reader.group_count(&incoming, &GroupKey::Origin),
        )?;

        let mut degrees: Vec<Degree> = vertices
            .into_iter()
            .filter_map(Element::into_vertex)
            .map(|vertex| Degree {
                in_degree: count_for(&in_counts, &vertex),
                out_degree: count_for(&out_counts, &vertex),
                vertex,
            })
            .collect();
        degrees.sort_by(|a, b| a.vertex.id.cmp(&b.vertex.id));
        Ok(degrees)
    }
}

fn count_for(counts: &BTreeMap<String, usize>, vertex: &Vertex) -> usize {
    counts.get(vertex.id.as_str()).copied().unwrap_or(0)
}

/// Project/domain scoping for analyzer scans.
pub(crate) fn scope_filter(scope: &VertexFilter) -> Filter {
    let mut parts = Vec::new();
    if let Some(project) = &scope.project {
        parts.push(Filter::eq(keys::PROJECT, project.as_str()));
    }
    if let Some(domain) = &scope.domain {
        parts.push(Filter::eq(keys::DOMAIN, domain.as_str()));
    }
    if parts.is_empty() {
        Filter::Always
    } else {
        Filter::And(parts)
    }
}
