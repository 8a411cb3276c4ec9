//! Dependency tree rendering for `kgraph deps` output.
//!
//! A [`Dependency`] records the full id path from the root, so the tree
//! is rebuilt by attaching each dependency under the second-to-last
//! vertex of its path.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use colored::Colorize;

use super::OutputConfig;
use super::color::{colorize_edge_type, colorize_id, dimmed};
use crate::analysis::Dependency;
use crate::domain::{Vertex, VertexId};

/// A node in a dependency tree for rendering purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepTreeNode {
    /// Vertex id of this node.
    pub id: VertexId,
    /// Vertex name.
    pub name: String,
    /// Edge type leading here from the parent (none for the root).
    pub edge_type: Option<String>,
    /// Hop level (0 for the root).
    pub level: usize,
    /// Children of this node.
    pub children: Vec<DepTreeNode>,
}

impl DepTreeNode {
    /// Build a tree rooted at `root` from a flat dependency list.
    ///
    /// Dependencies whose parent is not in the list are attached to the
    /// root. Children are ordered by name, then id.
    pub fn build(root: &Vertex, dependencies: &[Dependency]) -> Self {
        let mut by_parent: BTreeMap<&VertexId, Vec<&Dependency>> = BTreeMap::new();
        let known: BTreeSet<&VertexId> = dependencies.iter().map(|d| &d.vertex.id).collect();

        for dependency in dependencies {
            let parent = dependency
                .path
                .len()
                .checked_sub(2)
                .and_then(|i| dependency.path.get(i))
                .filter(|p| known.contains(p))
                .unwrap_or(&root.id);
            by_parent.entry(parent).or_default().push(dependency);
        }

        let mut node = Self {
            id: root.id.clone(),
            name: root.name.clone(),
            edge_type: None,
            level: 0,
            children: Vec::new(),
        };
        node.children = Self::children_of(&root.id, &by_parent, dependencies.len());
        node
    }

    fn children_of(
        parent: &VertexId,
        by_parent: &BTreeMap<&VertexId, Vec<&Dependency>>,
        budget: usize,
    ) -> Vec<DepTreeNode> {
        if budget == 0 {
            return Vec::new();
        }
        let mut children: Vec<DepTreeNode> = by_parent
            .get(parent)
            .into_iter()
            .flatten()
            .filter(|d| &d.vertex.id != parent)
            .map(|d| DepTreeNode {
                id: d.vertex.id.clone(),
                name: d.vertex.name.clone(),
                edge_type: Some(d.edge_type.to_string()),
                level: d.level,
                children: Self::children_of(&d.vertex.id, by_parent, budget - 1),
            })
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        children
    }

    /// Number of nodes below this one.
    pub fn descendants(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendants())
            .sum()
    }
}

/// Render a dependency tree with ASCII/Unicode connectors.
///
/// Renders a tree like:
/// ```text
/// ◆ kg-abc parse_config
/// ├── kg-def read_file (CALLS)
/// │   └── kg-ghi open (CALLS)
/// └── kg-jkl Config (USES)
/// ```
pub(crate) fn write_dep_tree<W: Write>(
    w: &mut W,
    root: &DepTreeNode,
    config: &OutputConfig,
) -> io::Result<()> {
    let root_icon = if config.use_ascii { "*" } else { "◆" };
    let root_icon = if config.use_colors {
        root_icon.cyan().bold().to_string()
    } else {
        root_icon.to_string()
    };

    writeln!(
        w,
        "{} {} {}",
        root_icon,
        colorize_id(root.id.as_str(), config),
        root.name
    )?;

    write_children(w, &root.children, &[], config)
}

/// `prefix_segments` tracks which ancestor levels still have siblings
/// below, for the vertical continuation lines.
fn write_children<W: Write>(
    w: &mut W,
    children: &[DepTreeNode],
    prefix_segments: &[bool],
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();

        let mut prefix = String::new();
        for &has_more in prefix_segments {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);
        let edge = child
            .edge_type
            .as_deref()
            .map(|t| format!(" ({})", colorize_edge_type(t, config)))
            .unwrap_or_default();

        writeln!(
            w,
            "{}{}{} {}{}",
            prefix,
            connector,
            colorize_id(child.id.as_str(), config),
            child.name,
            edge
        )?;

        if !child.children.is_empty() {
            let mut next = prefix_segments.to_vec();
            next.push(!is_last);
            write_children(w, &child.children, &next, config)?;
        }
    }

    Ok(())
}
