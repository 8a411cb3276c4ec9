//! Domain types for the knowledge graph.
//!
//! Vertices and edges are modelled as closed, strongly typed structures.
//! Type-specific vertex attributes live in the [`VertexKind`] tagged union;
//! genuinely free-form data goes in a single `metadata` string map.
//!
//! Caller input is parsed into *untrusted* types ([`VertexAttributes`],
//! [`VertexPatch`], [`EdgeAttributes`]) which structurally cannot carry
//! tenant, owner or timestamp fields. Those are stamped from the
//! [`SecurityContext`](crate::security::SecurityContext) by the repositories.

mod edge;
mod query;
mod vertex;

pub use edge::{Edge, EdgeAttributes, EdgeType};
pub use query::{
    GraphPath, OrderDirection, OrderField, Ordering, Pagination, PathElement, QueryResult,
    VertexFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use vertex::{
    Parameter, Vertex, VertexAttributes, VertexKind, VertexPatch, VertexType,
    MAX_NAME_LENGTH, MAX_TAGS,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Schema version stamped on every vertex written by this crate.
pub const SCHEMA_VERSION: u32 = 2;

/// Property keys understood by the graph engine.
///
/// These are the names the engine filters on; they are part of the stored
/// representation and must stay stable.
pub mod keys {
    /// Element id.
    pub const ID: &str = "id";
    /// Vertex type discriminant or edge type.
    pub const LABEL: &str = "label";
    /// Human-readable vertex name.
    pub const NAME: &str = "name";
    /// Vertex description.
    pub const DESCRIPTION: &str = "description";
    /// Project the vertex belongs to.
    pub const PROJECT: &str = "project";
    /// Domain the vertex belongs to.
    pub const DOMAIN: &str = "domain";
    /// Owning organization.
    pub const TENANT_ID: &str = "tenantId";
    /// Creator of the element.
    pub const USER_ID: &str = "userId";
    /// Owning team.
    pub const TEAM_ID: &str = "teamId";
    /// Visibility tier.
    pub const VISIBILITY: &str = "visibility";
    /// Access level granted on the vertex.
    pub const ACCESS_LEVEL: &str = "accessLevel";
    /// Users the vertex is explicitly shared with.
    pub const SHARED_WITH: &str = "sharedWith";
    /// Creation timestamp.
    pub const CREATED_AT: &str = "createdAt";
    /// Last update timestamp.
    pub const UPDATED_AT: &str = "updatedAt";
    /// Creator.
    pub const CREATED_BY: &str = "createdBy";
    /// Last updater.
    pub const UPDATED_BY: &str = "updatedBy";
    /// Optimistic version counter.
    pub const VERSION: &str = "version";
    /// Schema version.
    pub const SCHEMA_VERSION: &str = "schemaVersion";
    /// Tag set.
    pub const TAGS: &str = "tags";
    /// Keyword set.
    pub const KEYWORDS: &str = "keywords";
    /// Source file of a code artifact.
    pub const FILE_PATH: &str = "filePath";
    /// Function signature.
    pub const SIGNATURE: &str = "signature";
    /// Whether a function is async.
    pub const IS_ASYNC: &str = "isAsync";
    /// Name of a custom vertex type.
    pub const CUSTOM_TYPE: &str = "customType";
    /// Source vertex of an edge.
    pub const FROM_VERTEX_ID: &str = "fromVertexId";
    /// Target vertex of an edge.
    pub const TO_VERTEX_ID: &str = "toVertexId";
    /// Prefix for free-form metadata keys (`metadata.<key>`).
    pub const METADATA_PREFIX: &str = "metadata.";
}

/// Unique identifier for a vertex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub String);

impl VertexId {
    /// Create a new vertex id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VertexId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for an edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Access tier of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner (and explicit shares) may see it.
    #[default]
    Private,
    /// Members of the owning team may see it.
    Team,
    /// Every member of the tenant may see it.
    Organization,
    /// Users listed in `sharedWith` may see it.
    Shared,
}

impl Visibility {
    /// All visibility values.
    pub const ALL: [Visibility; 4] = [
        Visibility::Private,
        Visibility::Team,
        Visibility::Organization,
        Visibility::Shared,
    ];

    /// Stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Team => "team",
            Visibility::Organization => "organization",
            Visibility::Shared => "shared",
        }
    }

    /// Rank from most (0) to least restrictive.
    pub fn restrictiveness(self) -> u8 {
        match self {
            Visibility::Private => 0,
            Visibility::Shared => 1,
            Visibility::Team => 2,
            Visibility::Organization => 3,
        }
    }

    /// The more restrictive of two visibilities.
    pub fn most_restrictive(self, other: Visibility) -> Visibility {
        if other.restrictiveness() < self.restrictiveness() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "team" => Ok(Visibility::Team),
            "organization" | "org" => Ok(Visibility::Organization),
            "shared" => Ok(Visibility::Shared),
            other => Err(format!(
                "invalid visibility '{other}' (expected private, team, organization or shared)"
            )),
        }
    }
}

/// Access level granted on a vertex.
///
/// Ordered: `Read < Write < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Read-only.
    Read,
    /// Read and modify.
    #[default]
    Write,
    /// Read, modify and delete.
    Admin,
}

impl AccessLevel {
    /// Stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "admin" => Ok(AccessLevel::Admin),
            other => Err(format!(
                "invalid access level '{other}' (expected read, write or admin)"
            )),
        }
    }
}

/// A property value as seen by the graph engine's filters.
///
/// Variants are ordered so that values of the same kind compare naturally;
/// the engine uses this ordering for `order_by` steps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Number(i64),
    /// Timestamp.
    Timestamp(DateTime<Utc>),
    /// Single string.
    Text(String),
    /// Multi-valued string property.
    Set(BTreeSet<String>),
}

impl PropertyValue {
    /// Convenience constructor for text values.
    pub fn text(s: impl Into<String>) -> Self {
        PropertyValue::Text(s.into())
    }

    /// Render the value as a grouping key.
    pub fn to_key(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Timestamp(t) => t.to_rfc3339(),
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Set(values) => values.iter().cloned().collect::<Vec<_>>().join(","),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<Visibility> for PropertyValue {
    fn from(v: Visibility) -> Self {
        PropertyValue::Text(v.as_str().to_string())
    }
}

impl From<AccessLevel> for PropertyValue {
    fn from(a: AccessLevel) -> Self {
        PropertyValue::Text(a.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("private", Visibility::Private)]
    #[case("TEAM", Visibility::Team)]
    #[case("org", Visibility::Organization)]
    #[case("shared", Visibility::Shared)]
    fn test_visibility_from_str(#[case] input: &str, #[case] expected: Visibility) {
        assert_eq!(input.parse::<Visibility>().unwrap(), expected);
    }

    #[test]
    fn test_visibility_rejects_unknown() {
        let err = "public".parse::<Visibility>().unwrap_err();
        assert!(err.contains("public"));
    }

    #[rstest]
    #[case(Visibility::Organization, Visibility::Team, Visibility::Team)]
    #[case(Visibility::Team, Visibility::Shared, Visibility::Shared)]
    #[case(Visibility::Shared, Visibility::Private, Visibility::Private)]
    #[case(Visibility::Private, Visibility::Organization, Visibility::Private)]
    fn test_most_restrictive(
        #[case] a: Visibility,
        #[case] b: Visibility,
        #[case] expected: Visibility,
    ) {
        assert_eq!(a.most_restrictive(b), expected);
        assert_eq!(b.most_restrictive(a), expected);
    }

    #[test]
    fn test_access_level_ordering() {
        assert!(AccessLevel::Read < AccessLevel::Write);
        assert!(AccessLevel::Write < AccessLevel::Admin);
        assert_eq!(AccessLevel::default(), AccessLevel::Write);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&VertexId::new("kg-a1b2")).unwrap();
        assert_eq!(json, "\"kg-a1b2\"");
    }
}
