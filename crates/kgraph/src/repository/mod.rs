//! Secured data access over the graph engine.
//!
//! Repositories are the only code that issues writes against the engine,
//! and every query they build starts from
//! [`visibility_predicate`](crate::security::visibility_predicate).
//! They are cheap to clone and hold no per-request state; the caller's
//! [`SecurityContext`] is passed to each method.
//!
//! # Example
//!
//! ```
//! use kgraph::domain::{VertexAttributes, VertexKind};
//! use kgraph::engine::{GraphClient, InMemoryEngine};
//! use kgraph::id_generation::IdGenerator;
//! use kgraph::repository::VertexRepository;
//! use kgraph::security::SecurityContext;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> kgraph::error::Result<()> {
//!     let client = GraphClient::single(Arc::new(InMemoryEngine::new()));
//!     let vertices = VertexRepository::new(client, Arc::new(IdGenerator::default()));
//!     let ctx = SecurityContext::new("acme", "alice")?;
//!
//!     let created = vertices
//!         .create_vertex(&ctx, VertexAttributes::new(VertexKind::function(), "parse"))
//!         .await?;
//!     assert!(vertices.find_by_id(&ctx, &created.id).await?.is_some());
//!     Ok(())
//! }
//! ```

mod edge;
mod vertex;

pub use edge::{Degree, EdgeRepository};
pub use vertex::VertexRepository;

use crate::domain::{Vertex, VertexId};
use crate::engine::{Element, Filter, GraphEngine, Traversal};
use crate::error::Result;
use crate::security::{SecurityContext, visibility_predicate};

/// Predicate selecting the visible vertex with the given id.
pub(crate) fn visible_vertex_filter(ctx: &SecurityContext, id: &VertexId) -> Filter {
    Filter::id(id.as_str()).and(visibility_predicate(ctx))
}

/// Fetch a vertex through the visibility filter.
///
/// `None` covers both "does not exist" and "not visible".
pub(crate) async fn fetch_visible(
    engine: &dyn GraphEngine,
    ctx: &SecurityContext,
    id: &VertexId,
) -> Result<Option<Vertex>> {
    let traversal = Traversal::vertices()
        .has(visible_vertex_filter(ctx, id))
        .limit(1);
    let found = engine.to_list(&traversal).await?;
    Ok(found.into_iter().find_map(Element::into_vertex))
}
