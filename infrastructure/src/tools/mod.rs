//! Reconnaissance tool definitions
//!
//! - [`catalog`]: built-in tool table and config overrides

pub mod catalog;

pub use catalog::{CatalogError, build_catalog, builtin_catalog, builtin_tools};
