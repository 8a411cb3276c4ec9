//! Query inputs and result shapes: filters, pagination, ordering and paths.

use super::{keys, EdgeId, VertexId, VertexType, Visibility};
use serde::{Deserialize, Serialize};

/// Default page size for vertex queries.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Attribute filters for vertex queries.
///
/// All set fields must match (logical AND). The visibility predicate is
/// always applied in addition to these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexFilter {
    /// Match any of these vertex types.
    #[serde(default)]
    pub vertex_types: Vec<VertexType>,

    /// Exact project match.
    #[serde(default)]
    pub project: Option<String>,

    /// Exact domain match.
    #[serde(default)]
    pub domain: Option<String>,

    /// Exact name match.
    #[serde(default)]
    pub name: Option<String>,

    /// Vertex must carry this tag.
    #[serde(default)]
    pub tag: Option<String>,

    /// Exact owner match.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Exact team match.
    #[serde(default)]
    pub team_id: Option<String>,

    /// Exact visibility match.
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl VertexFilter {
    /// Filter restricted to a project and/or domain.
    pub fn scoped(project: Option<String>, domain: Option<String>) -> Self {
        Self {
            project,
            domain,
            ..Default::default()
        }
    }
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of matching vertices to skip.
    pub offset: usize,

    /// Maximum number of vertices to return.
    pub limit: usize,
}

impl Pagination {
    /// Build a pagination window, clamping the limit to [`MAX_PAGE_SIZE`].
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Field vertex queries can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    /// Order by name.
    Name,
    /// Order by creation time.
    #[default]
    CreatedAt,
    /// Order by last update time.
    UpdatedAt,
}

impl OrderField {
    /// The engine property key for this field.
    pub fn key(self) -> &'static str {
        match self {
            OrderField::Name => keys::NAME,
            OrderField::CreatedAt => keys::CREATED_AT,
            OrderField::UpdatedAt => keys::UPDATED_AT,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// Result ordering. Ties are broken by id for deterministic pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ordering {
    /// Field to order by.
    pub field: OrderField,

    /// Direction.
    pub direction: OrderDirection,
}

/// A page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    /// The page.
    pub data: Vec<T>,

    /// Total number of matches before pagination.
    pub count: usize,

    /// Whether more matches exist after this page.
    pub has_more: bool,

    /// Offset of the next page, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl<T> QueryResult<T> {
    /// Assemble a page from the filtered total and the page window.
    ///
    /// `has_more` is `offset + data.len() < count`.
    pub fn from_page(data: Vec<T>, count: usize, offset: usize) -> Self {
        let next = offset + data.len();
        let has_more = next < count;
        Self {
            data,
            count,
            has_more,
            cursor: has_more.then(|| next.to_string()),
        }
    }

    /// An empty result.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            count: 0,
            has_more: false,
            cursor: None,
        }
    }
}

/// One position in a [`GraphPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PathElement {
    /// A vertex position.
    Vertex(VertexId),
    /// An edge position.
    Edge(EdgeId),
}

/// An alternating sequence of vertex and edge ids produced by a traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPath {
    /// Vertex, edge, vertex, ... in traversal order.
    pub elements: Vec<PathElement>,
}

impl GraphPath {
    /// Number of edges traversed.
    pub fn length(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, PathElement::Edge(_)))
            .count()
    }

    /// Vertex ids in order.
    pub fn vertex_ids(&self) -> Vec<&VertexId> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                PathElement::Vertex(id) => Some(id),
                PathElement::Edge(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 25, true, Some("10"))]
    #[case(20, 5, 25, false, None)]
    #[case(0, 0, 0, false, None)]
    #[case(10, 10, 20, false, None)]
    fn test_has_more_follows_offset_plus_len(
        #[case] offset: usize,
        #[case] page_len: usize,
        #[case] total: usize,
        #[case] expected: bool,
        #[case] cursor: Option<&str>,
    ) {
        let page = QueryResult::from_page(vec![(); page_len], total, offset);
        assert_eq!(page.has_more, expected);
        assert_eq!(page.cursor.as_deref(), cursor);
        assert_eq!(page.count, total);
    }

    #[test]
    fn test_pagination_clamps_limit() {
        assert_eq!(Pagination::new(0, 0).limit, 1);
        assert_eq!(Pagination::new(0, 5000).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_graph_path_length_counts_edges() {
        let path = GraphPath {
            elements: vec![
                PathElement::Vertex(VertexId::new("a")),
                PathElement::Edge(EdgeId::new("e1")),
                PathElement::Vertex(VertexId::new("b")),
            ],
        };
        assert_eq!(path.length(), 1);
        assert_eq!(path.vertex_ids().len(), 2);
    }
}
