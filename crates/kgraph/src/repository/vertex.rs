//! Vertex CRUD with visibility enforced on every operation.

use super::{fetch_visible, visible_vertex_filter};
use crate::domain::{
    keys, AccessLevel, Ordering, Pagination, QueryResult, Vertex, VertexAttributes, VertexFilter,
    VertexId, VertexPatch, VertexType, Visibility, SCHEMA_VERSION,
};
use crate::engine::{Element, Filter, GraphClient, GroupKey, Traversal};
use crate::error::{Error, Operation, Result};
use crate::id_generation::IdGenerator;
use crate::security::{admin_predicate, visibility_predicate, write_predicate, SecurityContext};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Repository for vertices.
#[derive(Debug, Clone)]
pub struct VertexRepository {
    client: GraphClient,
    ids: Arc<IdGenerator>,
}

impl VertexRepository {
    /// Create a repository over `client`, synthesizing ids with `ids`.
    pub fn new(client: GraphClient, ids: Arc<IdGenerator>) -> Self {
        Self { client, ids }
    }

    /// Create a vertex owned by the caller.
    ///
    /// Tenant, owner, timestamps, version and schema version are stamped
    /// from `ctx`; `attrs` cannot carry them. Visibility defaults to
    /// private and access level to write.
    ///
    /// # Errors
    ///
    /// `Error::Validation` if `attrs` is structurally invalid (checked
    /// before the engine is contacted), `Error::Engine` on engine failure.
    pub async fn create_vertex(
        &self,
        ctx: &SecurityContext,
        attrs: VertexAttributes,
    ) -> Result<Vertex> {
        attrs.validate()?;

        let now = Utc::now();
        let id = self.ids.vertex_id(ctx.tenant_id(), &attrs.name);
        let vertex = Vertex {
            id,
            kind: attrs.kind,
            name: attrs.name.trim().to_string(),
            description: attrs.description,
            project: attrs.project,
            domain: attrs.domain,
            tenant_id: ctx.tenant_id().to_string(),
            user_id: ctx.user_id().to_string(),
            team_id: attrs.team_id,
            visibility: attrs.visibility.unwrap_or_default(),
            access_level: attrs.access_level.unwrap_or_default(),
            shared_with: attrs.shared_with,
            created_at: now,
            updated_at: now,
            created_by: ctx.user_id().to_string(),
            updated_by: ctx.user_id().to_string(),
            version: 1,
            schema_version: SCHEMA_VERSION,
            tags: attrs.tags,
            keywords: attrs.keywords,
            metadata: attrs.metadata,
        };

        let created = self.client.writer().add_vertex(vertex).await?;
        debug!(
            tenant = ctx.tenant_id(),
            user = ctx.user_id(),
            vertex_id = %created.id,
            vertex_type = %created.vertex_type(),
            "Created vertex"
        );
        Ok(created)
    }

    /// Find a vertex by id.
    ///
    /// Returns `None` both when the vertex does not exist and when it is
    /// not visible to `ctx`; callers cannot tell the two apart.
    pub async fn find_by_id(&self, ctx: &SecurityContext, id: &VertexId) -> Result<Option<Vertex>> {
        fetch_visible(self.client.reader(), ctx, id).await
    }

    /// Like [`find_by_id`](Self::find_by_id) but maps absence to
    /// `Error::NotFound`.
    pub async fn get(&self, ctx: &SecurityContext, id: &VertexId) -> Result<Vertex> {
        self.find_by_id(ctx, id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Whether a visible vertex with this id exists.
    pub async fn exists(&self, ctx: &SecurityContext, id: &VertexId) -> Result<bool> {
        let traversal = Traversal::vertices().has(visible_vertex_filter(ctx, id));
        Ok(self.client.reader().count(&traversal).await? > 0)
    }

    /// Query visible vertices.
    ///
    /// Visibility is applied first, then the attribute filters. `count` is
    /// the size of the filtered set before pagination; the page is taken
    /// after ordering (ties broken by id).
    ///
    /// The count and the page are two engine round-trips built from the
    /// same filter. Writes landing between them are not reconciled, so
    /// under concurrent modification the two may briefly disagree.
    pub async fn query(
        &self,
        ctx: &SecurityContext,
        filter: &VertexFilter,
        pagination: Pagination,
        ordering: Ordering,
    ) -> Result<QueryResult<Vertex>> {
        let base = Traversal::vertices().has(query_filter(ctx, filter));
        let page = base
            .clone()
            .order_by(ordering.field.key(), ordering.direction)
            .range(pagination.offset, pagination.limit);

        let reader = self.client.reader();
        let (count, elements) = tokio::try_join!(reader.count(&base), reader.to_list(&page))?;
        let data: Vec<Vertex> = elements.into_iter().filter_map(Element::into_vertex).collect();

        debug!(
            tenant = ctx.tenant_id(),
            count,
            returned = data.len(),
            offset = pagination.offset,
            "Queried vertices"
        );
        Ok(QueryResult::from_page(data, count, pagination.offset))
    }

    /// Count visible vertices matching `filter`.
    pub async fn count(&self, ctx: &SecurityContext, filter: &VertexFilter) -> Result<usize> {
        let traversal = Traversal::vertices().has(query_filter(ctx, filter));
        self.client.reader().count(&traversal).await
    }

    /// Count visible vertices per vertex type.
    pub async fn type_counts(&self, ctx: &SecurityContext) -> Result<BTreeMap<VertexType, usize>> {
        let traversal = Traversal::vertices().has(visibility_predicate(ctx));
        let groups = self
            .client
            .reader()
            .group_count(&traversal, &GroupKey::Property(keys::LABEL.to_string()))
            .await?;
        Ok(groups
            .into_iter()
            .filter_map(|(label, n)| label.parse::<VertexType>().ok().map(|t| (t, n)))
            .collect())
    }

    /// Apply a patch to a vertex the caller may write.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for an invalid patch (before any engine call)
    /// - `Error::NotFound` if the vertex is absent or invisible
    /// - `Error::InsufficientPermissions` if the vertex's access level is
    ///   `read`, or if the patch raises it to `admin` and neither the vertex
    ///   nor the caller already is
    pub async fn update_vertex(
        &self,
        ctx: &SecurityContext,
        id: &VertexId,
        patch: VertexPatch,
    ) -> Result<Vertex> {
        patch.validate()?;
        let mut vertex = self.get(ctx, id).await?;
        if patch.access_level == Some(AccessLevel::Admin)
            && vertex.access_level != AccessLevel::Admin
            && !ctx.is_admin()
        {
            return Err(Error::denied(Operation::UpdateVertex));
        }
        vertex.apply_patch(patch);
        self.write_back(ctx, vertex, Operation::UpdateVertex).await
    }

    /// Grant `user_ids` access to a vertex and set its visibility
    /// (default `shared`).
    ///
    /// # Errors
    ///
    /// As [`update_vertex`](Self::update_vertex); additionally
    /// `Error::Validation` for an empty or blank user list.
    pub async fn share_vertex(
        &self,
        ctx: &SecurityContext,
        id: &VertexId,
        user_ids: &[String],
        visibility: Option<Visibility>,
    ) -> Result<Vertex> {
        if user_ids.is_empty() {
            return Err(Error::validation("userIds", "at least one user id is required"));
        }
        if user_ids.iter().any(|u| u.trim().is_empty()) {
            return Err(Error::validation("userIds", "user ids must not be empty"));
        }

        let mut vertex = self.get(ctx, id).await?;
        vertex
            .shared_with
            .extend(user_ids.iter().map(|u| u.trim().to_string()));
        vertex.visibility = visibility.unwrap_or(Visibility::Shared);
        self.write_back(ctx, vertex, Operation::ShareVertex).await
    }

    /// Delete a vertex and its incident edges.
    ///
    /// Requires `accessLevel == admin` on the vertex.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if absent or invisible,
    /// `Error::InsufficientPermissions` without admin access.
    pub async fn delete_vertex(&self, ctx: &SecurityContext, id: &VertexId) -> Result<()> {
        self.get(ctx, id).await?;

        let guard = Filter::id(id.as_str()).and(admin_predicate(ctx));
        let dropped = self.client.writer().drop_vertices(&guard).await?;
        if dropped == 0 {
            warn!(
                tenant = ctx.tenant_id(),
                user = ctx.user_id(),
                vertex_id = %id,
                "Delete denied"
            );
            return Err(Error::denied(Operation::DeleteVertex));
        }

        debug!(tenant = ctx.tenant_id(), vertex_id = %id, "Deleted vertex");
        Ok(())
    }

    /// Stamp bookkeeping fields and write through the write-access guard.
    async fn write_back(
        &self,
        ctx: &SecurityContext,
        mut vertex: Vertex,
        operation: Operation,
    ) -> Result<Vertex> {
        vertex.updated_at = Utc::now();
        vertex.updated_by = ctx.user_id().to_string();
        vertex.version += 1;

        let id = vertex.id.clone();
        let guard = Filter::id(id.as_str()).and(write_predicate(ctx));
        match self.client.writer().set_properties(&guard, vertex).await? {
            Some(updated) => {
                debug!(
                    tenant = ctx.tenant_id(),
                    vertex_id = %id,
                    version = updated.version,
                    %operation,
                    "Updated vertex"
                );
                Ok(updated)
            }
            None => {
                warn!(
                    tenant = ctx.tenant_id(),
                    user = ctx.user_id(),
                    vertex_id = %id,
                    %operation,
                    "Write denied"
                );
                Err(Error::denied(operation))
            }
        }
    }
}

/// Visibility AND the caller's attribute filters.
fn query_filter(ctx: &SecurityContext, filter: &VertexFilter) -> Filter {
    visibility_predicate(ctx).and(attribute_filter(filter))
}

fn attribute_filter(filter: &VertexFilter) -> Filter {
    let mut parts = Vec::new();
    if !filter.vertex_types.is_empty() {
        parts.push(Filter::label(filter.vertex_types.iter().map(|t| t.as_str())));
    }
    let exact = [
        (keys::PROJECT, &filter.project),
        (keys::DOMAIN, &filter.domain),
        (keys::NAME, &filter.name),
        (keys::USER_ID, &filter.user_id),
        (keys::TEAM_ID, &filter.team_id),
    ];
    for (key, value) in exact {
        if let Some(value) = value {
            parts.push(Filter::eq(key, value.as_str()));
        }
    }
    if let Some(tag) = &filter.tag {
        parts.push(Filter::contains(keys::TAGS, tag.as_str()));
    }
    if let Some(visibility) = filter.visibility {
        parts.push(Filter::eq(keys::VISIBILITY, visibility));
    }
    if parts.is_empty() {
        Filter::Always
    } else {
        Filter::And(parts)
    }
}
