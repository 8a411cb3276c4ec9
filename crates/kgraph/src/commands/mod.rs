//! Command implementations that operate on the workspace rather than the
//! graph.

pub mod init;
