//! JSONL snapshots for the in-memory engine.
//!
//! Each line holds one record, tagged by `record`:
//!
//! ```text
//! {"record":"vertex","id":"kg-3f8a0c1d9e2b","kind":{"type":"Function"},...}
//! {"record":"edge","id":"kg-e0b41c7a2d55f","type":"CALLS",...}
//! ```
//!
//! Vertices are written before edges, each group sorted by id, so
//! snapshots diff cleanly under version control.

use super::InMemoryEngine;
use super::inner::EngineInner;
use crate::domain::{Edge, EdgeId, Vertex, VertexId};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One line of a snapshot file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "lowercase")]
enum Record {
    Vertex(Vertex),
    Edge(Edge),
}

/// Non-fatal problems found while loading a snapshot.
///
/// Loading continues past each of these; the offending record is skipped.
/// Callers should surface them to the user, since they indicate a
/// corrupted or hand-edited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line could not be parsed as a record.
    MalformedRecord {
        /// 1-based line number.
        line_number: usize,
        /// Parser error.
        error: String,
    },

    /// A vertex id appeared more than once; later occurrences are skipped.
    DuplicateVertex {
        /// 1-based line number of the skipped record.
        line_number: usize,
        /// The repeated id.
        id: VertexId,
    },

    /// An edge references a vertex that is not in the file, or repeats an
    /// edge id.
    OrphanedEdge {
        /// The skipped edge.
        id: EdgeId,
        /// Its source vertex.
        from: VertexId,
        /// Its target vertex.
        to: VertexId,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::MalformedRecord { line_number, error } => {
                write!(f, "skipped malformed record at line {line_number}: {error}")
            }
            LoadWarning::DuplicateVertex { line_number, id } => {
                write!(f, "skipped duplicate vertex {id} at line {line_number}")
            }
            LoadWarning::OrphanedEdge { id, from, to } => {
                write!(f, "skipped edge {id}: {from} -> {to} does not resolve")
            }
        }
    }
}

/// Load an engine from a snapshot file.
///
/// A missing file yields an empty engine. Malformed lines, duplicate
/// vertices and edges with missing endpoints are skipped and reported as
/// warnings.
///
/// # Errors
///
/// Returns `Error::Io` if the file exists but cannot be read.
///
/// # Example
///
/// ```no_run
/// # use kgraph::engine::load_snapshot;
/// # use std::path::Path;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let (engine, warnings) = load_snapshot(Path::new(".kgraph/graph.jsonl")).await?;
/// for warning in &warnings {
///     eprintln!("warning: {warning}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn load_snapshot(path: &Path) -> Result<(InMemoryEngine, Vec<LoadWarning>)> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            return Ok((InMemoryEngine::new(), Vec::new()));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let mut warnings = Vec::new();
    let mut edges = Vec::new();
    let mut inner = EngineInner::default();

    // First pass: vertices. Edges are held back until every vertex is known.
    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(line) {
            Ok(Record::Vertex(vertex)) => {
                let id = vertex.id.clone();
                if !inner.insert_vertex(vertex) {
                    warnings.push(LoadWarning::DuplicateVertex { line_number, id });
                }
            }
            Ok(Record::Edge(edge)) => edges.push(edge),
            Err(e) => warnings.push(LoadWarning::MalformedRecord {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    // Second pass: edges.
    for edge in edges {
        let (id, from, to) = (
            edge.id.clone(),
            edge.from_vertex_id.clone(),
            edge.to_vertex_id.clone(),
        );
        if !inner.insert_edge(edge) {
            warnings.push(LoadWarning::OrphanedEdge { id, from, to });
        }
    }

    info!(
        path = %path.display(),
        vertices = inner.graph.node_count(),
        edges = inner.graph.edge_count(),
        warnings = warnings.len(),
        "Loaded snapshot"
    );

    let engine = InMemoryEngine {
        inner: Arc::new(RwLock::new(inner)),
    };
    Ok((engine, warnings))
}

/// Save an engine to a snapshot file.
///
/// The write is atomic: records go to a temporary file which is then
/// renamed over `path`. If the process dies mid-write the previous
/// snapshot is left intact.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Json` if writing fails.
pub async fn save_snapshot(engine: &InMemoryEngine, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("jsonl.tmp");
    let (vertices, edges) = engine.export().await;

    let file = File::create(&temp_path).await?;
    let mut writer = BufWriter::new(file);

    let records = vertices
        .into_iter()
        .map(Record::Vertex)
        .chain(edges.into_iter().map(Record::Edge));
    for record in records {
        let json = serde_json::to_string(&record)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    drop(writer);

    tokio::fs::rename(&temp_path, path).await?;
    debug!(path = %path.display(), "Saved snapshot");
    Ok(())
}
