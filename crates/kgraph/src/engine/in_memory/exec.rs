//! Traversal interpreter.
//!
//! Executes a [`Traversal`] breadth-first: every step maps the full set of
//! live traversers to a new set. A traverser is the path of graph positions
//! it has visited; its last position is the current element.

use super::inner::EngineInner;
use crate::domain::{EdgeType, OrderDirection, PropertyValue};
use crate::engine::{
    Direction, Element, Endpoint, Filter, GroupKey, Repeat, Source, Step, Traversal,
};
use crate::error::{Error, Result};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Upper bound on live traversers before a traversal is aborted.
pub const MAX_TRAVERSERS: usize = 100_000;

/// A position in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Position {
    Node(NodeIndex),
    Link(EdgeIndex),
}

/// The path a traverser has walked; never empty.
#[derive(Debug, Clone)]
pub(super) struct Traverser {
    path: Vec<Position>,
}

impl Traverser {
    fn start(position: Position) -> Self {
        Self {
            path: vec![position],
        }
    }

    fn head(&self) -> Position {
        // Paths are created non-empty and only ever grow.
        self.path[self.path.len() - 1]
    }

    fn extend(&self, positions: &[Position]) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + positions.len());
        path.extend_from_slice(&self.path);
        path.extend_from_slice(positions);
        Self { path }
    }

    fn is_cyclic(&self) -> bool {
        let mut seen = HashSet::new();
        self.path
            .iter()
            .filter(|p| matches!(p, Position::Node(_)))
            .any(|p| !seen.insert(*p))
    }
}

impl EngineInner {
    /// Run a traversal to completion.
    pub(super) fn execute(&self, traversal: &Traversal) -> Result<Vec<Traverser>> {
        let start = self.start(traversal);
        self.run(traversal.steps(), start)
    }

    /// The element a traverser currently sits on.
    pub(super) fn current(&self, traverser: &Traverser) -> Element {
        self.element(traverser.head())
    }

    /// Every element on a traverser's path.
    pub(super) fn path(&self, traverser: &Traverser) -> Vec<Element> {
        traverser.path.iter().map(|&p| self.element(p)).collect()
    }

    /// Grouping key of a traverser, if it has one.
    pub(super) fn group_key(&self, traverser: &Traverser, key: &GroupKey) -> Option<String> {
        match key {
            GroupKey::Origin => Some(self.id_of(traverser.path[0]).to_string()),
            GroupKey::Property(name) => self
                .property(traverser.head(), name)
                .map(|v| v.to_key()),
        }
    }

    fn element(&self, position: Position) -> Element {
        match position {
            Position::Node(n) => Element::Vertex(self.graph[n].clone()),
            Position::Link(e) => Element::Edge(self.graph[e].clone()),
        }
    }

    fn id_of(&self, position: Position) -> &str {
        match position {
            Position::Node(n) => self.graph[n].id.as_str(),
            Position::Link(e) => self.graph[e].id.as_str(),
        }
    }

    fn property(&self, position: Position, key: &str) -> Option<PropertyValue> {
        match position {
            Position::Node(n) => self.graph[n].property(key),
            Position::Link(e) => self.graph[e].property(key),
        }
    }

    fn matches(&self, position: Position, filter: &Filter) -> bool {
        match position {
            Position::Node(n) => filter.matches(&self.graph[n]),
            Position::Link(e) => filter.matches(&self.graph[e]),
        }
    }

    fn start(&self, traversal: &Traversal) -> Vec<Traverser> {
        // A leading id filter narrows the start set through the index.
        let narrowing = match traversal.steps().first() {
            Some(Step::Has(filter)) => filter.clone(),
            _ => Filter::Always,
        };
        match traversal.source() {
            Source::Vertices => self
                .vertex_candidates(&narrowing)
                .into_iter()
                .map(|n| Traverser::start(Position::Node(n)))
                .collect(),
            Source::Edges => self
                .edge_candidates(&narrowing)
                .into_iter()
                .map(|e| Traverser::start(Position::Link(e)))
                .collect(),
        }
    }

    fn run(&self, steps: &[Step], mut traversers: Vec<Traverser>) -> Result<Vec<Traverser>> {
        for step in steps {
            traversers = self.apply(step, traversers)?;
            check_budget(traversers.len())?;
            if traversers.is_empty() {
                break;
            }
        }
        Ok(traversers)
    }

    fn apply(&self, step: &Step, traversers: Vec<Traverser>) -> Result<Vec<Traverser>> {
        let result = match step {
            Step::Has(filter) => traversers
                .into_iter()
                .filter(|t| self.matches(t.head(), filter))
                .collect(),
            Step::Vertex {
                direction,
                edge_types,
            } => self.adjacent(&traversers, *direction, edge_types, true),
            Step::Edge {
                direction,
                edge_types,
            } => self.adjacent(&traversers, *direction, edge_types, false),
            Step::EdgeVertex(endpoint) => traversers
                .iter()
                .filter_map(|t| {
                    let Position::Link(e) = t.head() else {
                        return None;
                    };
                    let (source, target) = self.graph.edge_endpoints(e)?;
                    let node = match endpoint {
                        Endpoint::Source => source,
                        Endpoint::Target => target,
                    };
                    Some(t.extend(&[Position::Node(node)]))
                })
                .collect(),
            Step::Repeat(repeat) => self.repeat(repeat, traversers)?,
            Step::SimplePath => traversers.into_iter().filter(|t| !t.is_cyclic()).collect(),
            Step::CyclicPath => traversers.into_iter().filter(Traverser::is_cyclic).collect(),
            Step::Dedup => {
                let mut seen = HashSet::new();
                traversers
                    .into_iter()
                    .filter(|t| seen.insert(t.head()))
                    .collect()
            }
            Step::OrderBy { key, direction } => self.order(traversers, key, *direction),
            Step::Range { offset, limit } => traversers
                .into_iter()
                .skip(*offset)
                .take(*limit)
                .collect(),
        };
        Ok(result)
    }

    /// Move traversers along incident edges, landing on the edge itself or,
    /// when `to_vertex` is set, on the vertex at its far end.
    fn adjacent(
        &self,
        traversers: &[Traverser],
        direction: Direction,
        edge_types: &[EdgeType],
        to_vertex: bool,
    ) -> Vec<Traverser> {
        let mut next = Vec::new();
        for traverser in traversers {
            let Position::Node(node) = traverser.head() else {
                continue;
            };
            for (edge, far) in self.incident(node, direction) {
                if !edge_types.is_empty() && !edge_types.contains(&self.graph[edge].edge_type) {
                    continue;
                }
                if to_vertex {
                    next.push(traverser.extend(&[Position::Link(edge), Position::Node(far)]));
                } else {
                    next.push(traverser.extend(&[Position::Link(edge)]));
                }
            }
        }
        next
    }

    /// Incident edges of `node` in `direction`, each with its far endpoint.
    fn incident(&self, node: NodeIndex, direction: Direction) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut found = Vec::new();
        if matches!(direction, Direction::Out | Direction::Both) {
            for e in self.graph.edges_directed(node, petgraph::Direction::Outgoing) {
                if let Some((_, target)) = self.graph.edge_endpoints(e.id()) {
                    found.push((e.id(), target));
                }
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for e in self.graph.edges_directed(node, petgraph::Direction::Incoming) {
                if let Some((source, _)) = self.graph.edge_endpoints(e.id()) {
                    found.push((e.id(), source));
                }
            }
        }
        // Deterministic order regardless of insertion history.
        found.sort_by(|a, b| self.graph[a.0].id.cmp(&self.graph[b.0].id));
        found
    }

    fn repeat(&self, repeat: &Repeat, traversers: Vec<Traverser>) -> Result<Vec<Traverser>> {
        let mut emitted = Vec::new();
        let mut current = traversers;

        for _ in 0..repeat.times {
            if current.is_empty() {
                break;
            }
            let mut next = self.run(&repeat.body, current)?;
            if repeat.until_cyclic {
                let (cyclic, open): (Vec<_>, Vec<_>) =
                    next.into_iter().partition(Traverser::is_cyclic);
                emitted.extend(cyclic);
                next = open;
            }
            if repeat.emit {
                emitted.extend(next.iter().cloned());
            }
            check_budget(emitted.len() + next.len())?;
            current = next;
        }

        if !repeat.emit {
            emitted.extend(current);
        }
        Ok(emitted)
    }

    fn order(
        &self,
        mut traversers: Vec<Traverser>,
        key: &str,
        direction: OrderDirection,
    ) -> Vec<Traverser> {
        let mut keyed: Vec<(Option<PropertyValue>, String, Traverser)> = traversers
            .drain(..)
            .map(|t| {
                let value = self.property(t.head(), key);
                let id = self.id_of(t.head()).to_string();
                (value, id, t)
            })
            .collect();
        keyed.sort_by(|a, b| {
            let by_value = match direction {
                OrderDirection::Asc => a.0.cmp(&b.0),
                OrderDirection::Desc => b.0.cmp(&a.0),
            };
            match by_value {
                Ordering::Equal => a.1.cmp(&b.1),
                other => other,
            }
        });
        keyed.into_iter().map(|(_, _, t)| t).collect()
    }
}

fn check_budget(live: usize) -> Result<()> {
    if live > MAX_TRAVERSERS {
        return Err(Error::Engine(format!(
            "traversal aborted: more than {MAX_TRAVERSERS} live traversers"
        )));
    }
    Ok(())
}
