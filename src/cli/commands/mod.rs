//! CLI command implementations

pub mod batches;
pub mod catalog;
pub mod completions;
pub mod import;
pub mod init;
pub mod stats;
pub mod summary;
