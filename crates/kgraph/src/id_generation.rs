//! Hash-based id synthesis for vertices and edges.
//!
//! Ids are collision resistant without a round-trip to the engine: the
//! hashed content combines the owning tenant, a caller-visible seed (name or
//! endpoints), a nanosecond timestamp and a process-wide sequence number.
//!
//! # Format
//!
//! - Vertices: `{prefix}-{hash}` (e.g. `kg-3f8a0c1d9e2b`)
//! - Edges: `{prefix}-e{hash}` (e.g. `kg-e0b41c7a2d55f`)
//!
//! # Example
//!
//! ```
//! use kgraph::id_generation::IdGenerator;
//!
//! let generator = IdGenerator::new("kg");
//! let id = generator.vertex_id("acme", "parse_config");
//! assert!(id.as_str().starts_with("kg-"));
//! ```

use crate::domain::{EdgeId, EdgeType, VertexId};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the hash part of generated ids.
pub const HASH_LENGTH: usize = 12;

/// Default prefix for generated ids.
pub const DEFAULT_PREFIX: &str = "kg";

/// Generates vertex and edge ids.
///
/// Thread-safe; share it behind an `Arc`.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    sequence: AtomicU64,
}

impl IdGenerator {
    /// Create a generator with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Synthesize a fresh vertex id.
    pub fn vertex_id(&self, tenant_id: &str, seed: &str) -> VertexId {
        VertexId::new(format!(
            "{}-{}",
            self.prefix,
            self.hash(&[tenant_id, seed])
        ))
    }

    /// Synthesize a fresh edge id.
    pub fn edge_id(
        &self,
        tenant_id: &str,
        from: &VertexId,
        to: &VertexId,
        edge_type: EdgeType,
    ) -> EdgeId {
        EdgeId::new(format!(
            "{}-e{}",
            self.prefix,
            self.hash(&[tenant_id, from.as_str(), to.as_str(), edge_type.as_str()])
        ))
    }

    fn hash(&self, parts: &[&str]) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(b"|");
        }
        hasher.update(timestamp.to_le_bytes());
        hasher.update(sequence.to_le_bytes());
        let digest = hasher.finalize();

        encode_base36(&digest[..8], HASH_LENGTH)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Encode up to eight bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut n: u64 = 0;
    for &byte in bytes {
        n = n.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut out = Vec::with_capacity(length);
    while out.len() < length {
        out.push(BASE36_CHARS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Check whether `id` looks like an id this generator could have produced.
pub fn is_well_formed(id: &str, prefix: &str) -> bool {
    let Some(rest) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };
    let hash = rest.strip_prefix('e').filter(|h| h.len() == HASH_LENGTH).unwrap_or(rest);
    hash.len() == HASH_LENGTH
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}
