//! Traversal descriptions executed by a [`GraphEngine`](super::GraphEngine).
//!
//! A [`Traversal`] is a start set plus an ordered list of [`Step`]s, built
//! fluently:
//!
//! ```
//! use kgraph::domain::EdgeType;
//! use kgraph::engine::{Filter, Traversal};
//!
//! let t = Traversal::vertices()
//!     .has(Filter::id("kg-1"))
//!     .out([EdgeType::Calls])
//!     .simple_path()
//!     .limit(100);
//! assert_eq!(t.steps().len(), 4);
//! ```
//!
//! Vertex steps (`out`, `in_`, `both`) record the traversed edge in the
//! traverser's path, so collected paths alternate vertex, edge, vertex.

use super::Filter;
use crate::domain::{EdgeType, OrderDirection};

/// Where a traversal starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Every vertex.
    Vertices,
    /// Every edge.
    Edges,
}

/// Edge direction relative to the current vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow outgoing edges.
    #[default]
    Out,
    /// Follow incoming edges.
    In,
    /// Follow edges in either direction.
    Both,
}

/// Which endpoint of an edge an edge-to-vertex step moves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The edge's source vertex.
    Source,
    /// The edge's target vertex.
    Target,
}

/// A bounded loop over a body of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    /// Steps applied on every iteration.
    pub body: Vec<Step>,
    /// Maximum number of iterations.
    pub times: usize,
    /// Emit traversers after every iteration, not only at the end.
    pub emit: bool,
    /// Stop extending (and emit) a traverser once its path revisits a vertex.
    pub until_cyclic: bool,
}

/// One step of a traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Keep traversers whose current element matches.
    Has(Filter),
    /// Move to adjacent vertices, recording the edge in the path.
    /// An empty type list means all edge types.
    Vertex {
        /// Direction to follow.
        direction: Direction,
        /// Allowed edge types.
        edge_types: Vec<EdgeType>,
    },
    /// Move to incident edges.
    Edge {
        /// Direction to follow.
        direction: Direction,
        /// Allowed edge types.
        edge_types: Vec<EdgeType>,
    },
    /// Move from an edge to one of its endpoints.
    EdgeVertex(Endpoint),
    /// Loop over a body of steps.
    Repeat(Repeat),
    /// Drop traversers whose path visits a vertex twice.
    SimplePath,
    /// Keep only traversers whose path visits a vertex twice.
    CyclicPath,
    /// Drop traversers at an element already seen.
    Dedup,
    /// Sort by a property of the current element; ties broken by id.
    OrderBy {
        /// Property key.
        key: String,
        /// Sort direction.
        direction: OrderDirection,
    },
    /// Skip `offset` traversers and keep at most `limit`.
    Range {
        /// Traversers to skip.
        offset: usize,
        /// Traversers to keep.
        limit: usize,
    },
}

/// Grouping key for `group_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// A property of the current element.
    Property(String),
    /// The id of the first element of the traverser's path.
    Origin,
}

/// A traversal description.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    source: Source,
    steps: Vec<Step>,
}

impl Traversal {
    /// Start from all vertices.
    pub fn vertices() -> Self {
        Self {
            source: Source::Vertices,
            steps: Vec::new(),
        }
    }

    /// Start from all edges.
    pub fn edges() -> Self {
        Self {
            source: Source::Edges,
            steps: Vec::new(),
        }
    }

    /// An anonymous step list, for use as a [`Repeat`] body.
    pub fn anonymous() -> Self {
        Self::vertices()
    }

    /// The start set.
    pub fn source(&self) -> Source {
        self.source
    }

    /// The steps in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Consume the traversal, returning its steps.
    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Append a raw step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Filter the current element.
    #[must_use]
    pub fn has(self, filter: Filter) -> Self {
        self.step(Step::Has(filter))
    }

    /// Move along edges in `direction`.
    #[must_use]
    pub fn to<I: IntoIterator<Item = EdgeType>>(self, direction: Direction, edge_types: I) -> Self {
        self.step(Step::Vertex {
            direction,
            edge_types: edge_types.into_iter().collect(),
        })
    }

    /// Move along outgoing edges.
    #[must_use]
    pub fn out<I: IntoIterator<Item = EdgeType>>(self, edge_types: I) -> Self {
        self.to(Direction::Out, edge_types)
    }

    /// Move along incoming edges.
    #[must_use]
    pub fn in_<I: IntoIterator<Item = EdgeType>>(self, edge_types: I) -> Self {
        self.to(Direction::In, edge_types)
    }

    /// Move along edges in either direction.
    #[must_use]
    pub fn both<I: IntoIterator<Item = EdgeType>>(self, edge_types: I) -> Self {
        self.to(Direction::Both, edge_types)
    }

    /// Move to outgoing edges.
    #[must_use]
    pub fn out_e<I: IntoIterator<Item = EdgeType>>(self, edge_types: I) -> Self {
        self.step(Step::Edge {
            direction: Direction::Out,
            edge_types: edge_types.into_iter().collect(),
        })
    }

    /// Move to incoming edges.
    #[must_use]
    pub fn in_e<I: IntoIterator<Item = EdgeType>>(self, edge_types: I) -> Self {
        self.step(Step::Edge {
            direction: Direction::In,
            edge_types: edge_types.into_iter().collect(),
        })
    }

    /// Move from an edge to its target.
    #[must_use]
    pub fn in_v(self) -> Self {
        self.step(Step::EdgeVertex(Endpoint::Target))
    }

    /// Move from an edge to its source.
    #[must_use]
    pub fn out_v(self) -> Self {
        self.step(Step::EdgeVertex(Endpoint::Source))
    }

    /// Repeat `body` up to `times` times.
    #[must_use]
    pub fn repeat(self, body: Traversal, times: usize, emit: bool, until_cyclic: bool) -> Self {
        self.step(Step::Repeat(Repeat {
            body: body.into_steps(),
            times,
            emit,
            until_cyclic,
        }))
    }

    /// Drop paths that revisit a vertex.
    #[must_use]
    pub fn simple_path(self) -> Self {
        self.step(Step::SimplePath)
    }

    /// Keep only paths that revisit a vertex.
    #[must_use]
    pub fn cyclic_path(self) -> Self {
        self.step(Step::CyclicPath)
    }

    /// Drop duplicate current elements.
    #[must_use]
    pub fn dedup(self) -> Self {
        self.step(Step::Dedup)
    }

    /// Sort by a property.
    #[must_use]
    pub fn order_by(self, key: &str, direction: OrderDirection) -> Self {
        self.step(Step::OrderBy {
            key: key.to_string(),
            direction,
        })
    }

    /// Skip and take.
    #[must_use]
    pub fn range(self, offset: usize, limit: usize) -> Self {
        self.step(Step::Range { offset, limit })
    }

    /// Keep at most `limit` traversers.
    #[must_use]
    pub fn limit(self, limit: usize) -> Self {
        self.range(0, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_body_is_captured_as_steps() {
        let body = Traversal::anonymous()
            .out([EdgeType::Calls])
            .has(Filter::Always);
        let t = Traversal::vertices().repeat(body, 3, true, false);
        match &t.steps()[0] {
            Step::Repeat(r) => {
                assert_eq!(r.body.len(), 2);
                assert_eq!(r.times, 3);
                assert!(r.emit);
            }
            other => panic!("expected repeat, got {other:?}"),
        }
    }

    #[test]
    fn test_limit_is_a_zero_offset_range() {
        let t = Traversal::edges().limit(5);
        assert_eq!(t.source(), Source::Edges);
        assert_eq!(t.steps(), &[Step::Range { offset: 0, limit: 5 }]);
    }
}
