//! kgraph - a multi-tenant knowledge graph access layer.
//!
//! Vertices (functions, models, systems, concepts, ...) and typed edges
//! live in a property graph. Every read, write and traversal runs under a
//! [`SecurityContext`](security::SecurityContext) and is filtered by tenant
//! and visibility, including at every hop of a multi-hop walk. On top of
//! the secured repositories sit dependency, impact and pattern analyzers.
//!
//! The crate ships both the library and the `kgraph` CLI, which persists
//! the graph to a JSONL snapshot in `.kgraph/`.

#![forbid(unsafe_code)]

// Data model and security
pub mod domain;
pub mod error;
pub mod id_generation;
pub mod security;

// Graph engine boundary and reference engine
pub mod engine;

// Secured data access
pub mod analysis;
pub mod repository;
pub mod traversal;

// CLI support
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
