//! Infrastructure layer for subrecon
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the local process runner and its registry, the
//! built-in tool catalog, and configuration file loading.

pub mod config;
pub mod process;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileExecutionConfig, FilePipelineConfig,
    FileToolConfig,
};
pub use process::{LocalProcessRunner, ProcessRegistry, RegistryStats, RunnerConfig};
pub use tools::{CatalogError, build_catalog, builtin_catalog};
