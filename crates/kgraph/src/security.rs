//! Caller identity and the visibility rules derived from it.
//!
//! Every repository and traversal operation takes a [`SecurityContext`]
//! explicitly. The rule deciding which vertices a context may see is
//! defined exactly once, in [`visibility_predicate`], and is expressed as a
//! [`Filter`] so the engine evaluates it during the scan instead of after
//! materializing candidates.
//!
//! A vertex is visible to a context when it belongs to the context's tenant
//! **and** at least one of these holds:
//!
//! 1. it is private and owned by the caller;
//! 2. it is team-scoped and its team is one of the caller's teams;
//! 3. it is organization-wide;
//! 4. the caller is listed in its `sharedWith` set.
//!
//! The tenant check wraps the disjunction, so a cross-tenant vertex never
//! reaches any of the four branches.

use crate::domain::{AccessLevel, Vertex, Visibility, keys};
use crate::engine::Filter;
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Identity and entitlements of the caller of one request.
///
/// Built once per request with [`SecurityContext::new`] and the `with_*`
/// builders, then only read.
///
/// # Example
///
/// ```
/// use kgraph::security::SecurityContext;
///
/// let ctx = SecurityContext::new("acme", "alice")?
///     .with_team("platform")
///     .with_team("search");
/// assert!(ctx.is_member_of("platform"));
/// # Ok::<(), kgraph::error::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    tenant_id: String,
    user_id: String,
    team_ids: BTreeSet<String>,
    access_levels: BTreeSet<AccessLevel>,
    is_admin: bool,
}

impl SecurityContext {
    /// Create a context for `user_id` within `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if either id is blank.
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let tenant_id = tenant_id.into();
        let user_id = user_id.into();
        if tenant_id.trim().is_empty() {
            return Err(Error::validation("tenantId", "must not be empty"));
        }
        if user_id.trim().is_empty() {
            return Err(Error::validation("userId", "must not be empty"));
        }
        Ok(Self {
            tenant_id,
            user_id,
            team_ids: BTreeSet::new(),
            access_levels: BTreeSet::from([AccessLevel::Read]),
            is_admin: false,
        })
    }

    /// Add a team membership. Blank team ids are ignored.
    #[must_use]
    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        let team_id = team_id.into();
        if !team_id.trim().is_empty() {
            self.team_ids.insert(team_id);
        }
        self
    }

    /// Add several team memberships.
    #[must_use]
    pub fn with_teams<I, S>(self, team_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        team_ids.into_iter().fold(self, Self::with_team)
    }

    /// Grant an access level.
    #[must_use]
    pub fn with_access_level(mut self, level: AccessLevel) -> Self {
        self.access_levels.insert(level);
        self
    }

    /// Mark the caller as a tenant administrator.
    ///
    /// This is informational: per-vertex `accessLevel` checks still apply.
    #[must_use]
    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self.access_levels.insert(AccessLevel::Admin);
        self
    }

    /// The caller's tenant.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The caller's user id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Teams the caller belongs to.
    pub fn team_ids(&self) -> &BTreeSet<String> {
        &self.team_ids
    }

    /// Access levels granted to the caller.
    pub fn access_levels(&self) -> &BTreeSet<AccessLevel> {
        &self.access_levels
    }

    /// Whether the caller is a tenant administrator.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether the caller belongs to `team_id`.
    pub fn is_member_of(&self, team_id: &str) -> bool {
        self.team_ids.contains(team_id)
    }
}

/// The tenant-isolation predicate on its own.
///
/// Applies to both vertices and edges.
pub fn tenant_predicate(ctx: &SecurityContext) -> Filter {
    Filter::eq(keys::TENANT_ID, ctx.tenant_id())
}

/// The predicate selecting every vertex `ctx` may read.
///
/// ```
/// use kgraph::security::{SecurityContext, visibility_predicate};
///
/// let ctx = SecurityContext::new("acme", "alice")?;
/// let filter = visibility_predicate(&ctx);
/// assert!(matches!(filter, kgraph::engine::Filter::And(_)));
/// # Ok::<(), kgraph::error::Error>(())
/// ```
pub fn visibility_predicate(ctx: &SecurityContext) -> Filter {
    let mut branches = vec![Filter::And(vec![
        Filter::eq(keys::USER_ID, ctx.user_id()),
        Filter::eq(keys::VISIBILITY, Visibility::Private),
    ])];

    // With no teams the branch is omitted entirely; an empty `within`
    // would be unsatisfiable anyway, but omission makes that explicit.
    if !ctx.team_ids().is_empty() {
        branches.push(Filter::And(vec![
            Filter::within(keys::TEAM_ID, ctx.team_ids().iter().map(String::as_str)),
            Filter::eq(keys::VISIBILITY, Visibility::Team),
        ]));
    }

    branches.push(Filter::eq(keys::VISIBILITY, Visibility::Organization));
    branches.push(Filter::contains(keys::SHARED_WITH, ctx.user_id()));

    Filter::And(vec![tenant_predicate(ctx), Filter::Or(branches)])
}

/// Visible vertices the caller may modify (`accessLevel` write or admin).
pub fn write_predicate(ctx: &SecurityContext) -> Filter {
    visibility_predicate(ctx).and(Filter::within(
        keys::ACCESS_LEVEL,
        [AccessLevel::Write, AccessLevel::Admin],
    ))
}

/// Visible vertices the caller may delete (`accessLevel` admin).
pub fn admin_predicate(ctx: &SecurityContext) -> Filter {
    visibility_predicate(ctx).and(Filter::eq(keys::ACCESS_LEVEL, AccessLevel::Admin))
}

/// Whether `ctx` may read `vertex`.
pub fn can_read(ctx: &SecurityContext, vertex: &Vertex) -> bool {
    visibility_predicate(ctx).matches(vertex)
}

/// Whether `ctx` may modify `vertex`.
pub fn can_write(ctx: &SecurityContext, vertex: &Vertex) -> bool {
    write_predicate(ctx).matches(vertex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{VertexId, VertexKind};
    use chrono::Utc;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn vertex(visibility: Visibility) -> Vertex {
        let now = Utc::now();
        Vertex {
            id: VertexId::new("kg-1"),
            kind: VertexKind::function(),
            name: "f".into(),
            description: String::new(),
            project: String::new(),
            domain: String::new(),
            tenant_id: "acme".into(),
            user_id: "owner".into(),
            team_id: Some("platform".into()),
            visibility,
            access_level: AccessLevel::Write,
            shared_with: BTreeSet::from(["friend".to_string()]),
            created_at: now,
            updated_at: now,
            created_by: "owner".into(),
            updated_by: "owner".into(),
            version: 1,
            schema_version: crate::domain::SCHEMA_VERSION,
            tags: BTreeSet::new(),
            keywords: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    fn ctx(tenant: &str, user: &str, teams: &[&str]) -> SecurityContext {
        SecurityContext::new(tenant, user)
            .unwrap()
            .with_teams(teams.iter().copied())
    }

    #[rstest]
    #[case::private_owner(Visibility::Private, ctx("acme", "owner", &[]), true)]
    #[case::private_stranger(Visibility::Private, ctx("acme", "bob", &["platform"]), false)]
    #[case::team_member(Visibility::Team, ctx("acme", "bob", &["platform"]), true)]
    #[case::team_outsider(Visibility::Team, ctx("acme", "bob", &["search"]), false)]
    #[case::team_owner_not_member(Visibility::Team, ctx("acme", "owner", &[]), false)]
    #[case::organization_member(Visibility::Organization, ctx("acme", "bob", &[]), true)]
    #[case::organization_other_tenant(Visibility::Organization, ctx("globex", "bob", &[]), false)]
    #[case::shared_recipient(Visibility::Shared, ctx("acme", "friend", &[]), true)]
    #[case::shared_stranger(Visibility::Shared, ctx("acme", "bob", &["platform"]), false)]
    #[case::shared_recipient_other_tenant(Visibility::Shared, ctx("globex", "friend", &[]), false)]
    fn test_visibility_matrix(
        #[case] visibility: Visibility,
        #[case] ctx: SecurityContext,
        #[case] visible: bool,
    ) {
        assert_eq!(can_read(&ctx, &vertex(visibility)), visible);
    }

    #[test]
    fn test_cross_tenant_never_visible_for_any_visibility() {
        let outsider = ctx("globex", "owner", &["platform"]);
        for visibility in Visibility::ALL {
            assert!(!can_read(&outsider, &vertex(visibility)), "{visibility}");
        }
    }

    #[test]
    fn test_empty_teams_omit_team_branch() {
        let filter = visibility_predicate(&ctx("acme", "bob", &[]));
        let Filter::And(parts) = filter else {
            panic!("expected And");
        };
        let Filter::Or(branches) = &parts[1] else {
            panic!("expected Or");
        };
        assert_eq!(branches.len(), 3);
    }

    #[test]
    fn test_write_requires_write_or_admin_level() {
        let owner = ctx("acme", "owner", &[]);
        let mut v = vertex(Visibility::Private);
        assert!(can_write(&owner, &v));
        v.access_level = AccessLevel::Read;
        assert!(can_read(&owner, &v));
        assert!(!can_write(&owner, &v));
        v.access_level = AccessLevel::Admin;
        assert!(admin_predicate(&owner).matches(&v));
    }

    #[test]
    fn test_admin_flag_does_not_bypass_vertex_checks() {
        let admin = ctx("acme", "root", &[]).as_admin();
        assert!(admin.is_admin());
        assert!(!can_read(&admin, &vertex(Visibility::Private)));
    }

    #[test]
    fn test_blank_identity_rejected() {
        assert!(SecurityContext::new("", "u1").is_err());
        assert!(SecurityContext::new("acme", "  ").is_err());
        let c = ctx("acme", "u1", &["", "t1"]);
        assert_eq!(c.team_ids().len(), 1);
    }
}
