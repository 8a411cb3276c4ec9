//! Edge types: typed, directed relationships between vertices.

use super::{keys, EdgeId, PropertyValue, VertexId, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Type of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Caller invokes callee.
    Calls,
    /// Source uses target.
    Uses,
    /// Source implements target.
    Implements,
    /// Generic dependency.
    DependsOn,
    /// Source belongs to target (membership).
    BelongsTo,
    /// Source extends (inherits from) target.
    Extends,
    /// Source mentions target.
    References,
    /// Source contains target.
    Contains,
}

impl EdgeType {
    /// All edge types.
    pub const ALL: [EdgeType; 8] = [
        EdgeType::Calls,
        EdgeType::Uses,
        EdgeType::Implements,
        EdgeType::DependsOn,
        EdgeType::BelongsTo,
        EdgeType::Extends,
        EdgeType::References,
        EdgeType::Contains,
    ];

    /// Edge types that express a dependency of source on target.
    pub const DEPENDENCY: [EdgeType; 6] = [
        EdgeType::Calls,
        EdgeType::Uses,
        EdgeType::Implements,
        EdgeType::DependsOn,
        EdgeType::Extends,
        EdgeType::References,
    ];

    /// Label string used by the engine.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Calls => "CALLS",
            EdgeType::Uses => "USES",
            EdgeType::Implements => "IMPLEMENTS",
            EdgeType::DependsOn => "DEPENDS_ON",
            EdgeType::BelongsTo => "BELONGS_TO",
            EdgeType::Extends => "EXTENDS",
            EdgeType::References => "REFERENCES",
            EdgeType::Contains => "CONTAINS",
        }
    }

    /// Whether a change to the target is likely to break the source.
    ///
    /// Inheritance, implementation, direct calls and declared dependencies
    /// are hard couplings; usage and references are soft.
    pub fn is_hard_coupling(self) -> bool {
        matches!(
            self,
            EdgeType::Extends | EdgeType::Implements | EdgeType::Calls | EdgeType::DependsOn
        )
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        EdgeType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown edge type '{s}'"))
    }
}

/// A directed, typed relationship between two vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier.
    pub id: EdgeId,

    /// Relationship type.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Source vertex.
    pub from_vertex_id: VertexId,

    /// Target vertex.
    pub to_vertex_id: VertexId,

    /// Owning organization.
    pub tenant_id: String,

    /// Creator.
    pub user_id: String,

    /// Visibility recorded at creation time.
    pub visibility: Visibility,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Edge {
    /// Look up a property by its engine key.
    pub fn property(&self, key: &str) -> Option<PropertyValue> {
        let value = match key {
            keys::ID => PropertyValue::text(self.id.as_str()),
            keys::LABEL => PropertyValue::from(self.edge_type.as_str()),
            keys::FROM_VERTEX_ID => PropertyValue::text(self.from_vertex_id.as_str()),
            keys::TO_VERTEX_ID => PropertyValue::text(self.to_vertex_id.as_str()),
            keys::TENANT_ID => PropertyValue::text(self.tenant_id.clone()),
            keys::USER_ID => PropertyValue::text(self.user_id.clone()),
            keys::VISIBILITY => self.visibility.into(),
            keys::CREATED_AT => PropertyValue::Timestamp(self.created_at),
            keys::UPDATED_AT => PropertyValue::Timestamp(self.updated_at),
            other => {
                let meta_key = other.strip_prefix(keys::METADATA_PREFIX)?;
                return self.metadata.get(meta_key).cloned().map(PropertyValue::Text);
            }
        };
        Some(value)
    }
}

/// Untrusted caller input for creating an edge.
///
/// Has no tenant or owner fields; those come from the security context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAttributes {
    /// Relationship type.
    pub edge_type: EdgeType,

    /// Explicit visibility. When absent the edge takes the more restrictive
    /// visibility of its two endpoints.
    #[serde(default)]
    pub visibility: Option<Visibility>,

    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl EdgeAttributes {
    /// Attributes for an edge of the given type with defaults elsewhere.
    pub fn new(edge_type: EdgeType) -> Self {
        Self {
            edge_type,
            visibility: None,
            metadata: BTreeMap::new(),
        }
    }
}

impl From<EdgeType> for EdgeAttributes {
    fn from(edge_type: EdgeType) -> Self {
        Self::new(edge_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CALLS", EdgeType::Calls)]
    #[case("depends_on", EdgeType::DependsOn)]
    #[case("depends-on", EdgeType::DependsOn)]
    #[case(" extends ", EdgeType::Extends)]
    fn test_edge_type_from_str(#[case] input: &str, #[case] expected: EdgeType) {
        assert_eq!(input.parse::<EdgeType>().unwrap(), expected);
    }

    #[test]
    fn test_edge_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&EdgeType::BelongsTo).unwrap();
        assert_eq!(json, "\"BELONGS_TO\"");
    }

    #[test]
    fn test_dependency_types_exclude_structural_edges() {
        assert!(!EdgeType::DEPENDENCY.contains(&EdgeType::BelongsTo));
        assert!(!EdgeType::DEPENDENCY.contains(&EdgeType::Contains));
    }

    #[test]
    fn test_hard_coupling_classification() {
        assert!(EdgeType::Extends.is_hard_coupling());
        assert!(EdgeType::Implements.is_hard_coupling());
        assert!(!EdgeType::References.is_hard_coupling());
        assert!(!EdgeType::Uses.is_hard_coupling());
    }
}
