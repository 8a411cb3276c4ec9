//! Error types for kgraph operations.
//!
//! The taxonomy mirrors how callers are expected to react:
//!
//! - [`Error::NotFound`]: the id does not exist *or* is not visible to the
//!   caller. The two cases are deliberately indistinguishable.
//! - [`Error::InsufficientPermissions`]: the caller can see the entity but
//!   lacks the access level the mutation requires.
//! - [`Error::Validation`]: caller-supplied attributes are structurally
//!   invalid. Raised before any engine round-trip.
//! - [`Error::Engine`]: the graph engine is unreachable or failed at the
//!   transport level. Propagated unchanged; this layer never retries.

use std::io;
use thiserror::Error;

/// The mutation a permission check guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Updating vertex attributes.
    UpdateVertex,
    /// Deleting a vertex.
    DeleteVertex,
    /// Sharing a vertex with other users.
    ShareVertex,
    /// Creating an edge between two vertices.
    CreateEdge,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::UpdateVertex => "update vertex",
            Operation::DeleteVertex => "delete vertex",
            Operation::ShareVertex => "share vertex",
            Operation::CreateEdge => "create edge",
        };
        write!(f, "{s}")
    }
}

/// The error type for kgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested entity does not exist or is not visible to the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller lacks the access level required for the mutation.
    ///
    /// Edge creation failures never name the endpoint that failed.
    #[error("Insufficient permissions to {operation}")]
    InsufficientPermissions {
        /// The operation that was refused.
        operation: Operation,
    },

    /// Caller-supplied attributes are structurally invalid.
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The graph engine failed or could not be reached.
    #[error("Graph engine error: {0}")]
    Engine(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a validation error.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    /// Build a permissions error for the given operation.
    pub fn denied(operation: Operation) -> Self {
        Error::InsufficientPermissions { operation }
    }

    /// Whether retrying at a higher level could succeed.
    ///
    /// Only engine failures are transient; domain errors are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Engine(_))
    }

    /// Whether the error was caused by the caller's request
    /// (the 400/403/404 family).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::InsufficientPermissions { .. } | Error::Validation { .. }
        )
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.kgraph/` directory was found.
    #[error("Not a kgraph workspace (or any of the parent directories). Run 'kgraph init' first.")]
    NotInitialized,

    /// A workspace already exists at the target location.
    #[error("kgraph is already initialized in {0}")]
    AlreadyInitialized(String),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration file: {0}")]
    Parse(String),

    /// A configuration value is out of range.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The configuration key.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The configured engine backend is not supported.
    #[error("Unsupported engine backend: {0}")]
    UnsupportedBackend(String),
}

/// A specialized Result type for kgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_engine_errors_are_retryable() {
        assert!(Error::Engine("connection reset".into()).is_retryable());
        assert!(!Error::NotFound("v-1".into()).is_retryable());
        assert!(!Error::denied(Operation::DeleteVertex).is_retryable());
        assert!(!Error::validation("name", "empty").is_retryable());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::NotFound("v-1".into()).is_client_error());
        assert!(Error::denied(Operation::CreateEdge).is_client_error());
        assert!(Error::validation("name", "empty").is_client_error());
        assert!(!Error::Engine("down".into()).is_client_error());
    }

    #[test]
    fn test_edge_denial_message_names_no_endpoint() {
        let msg = Error::denied(Operation::CreateEdge).to_string();
        assert_eq!(msg, "Insufficient permissions to create edge");
    }
}
