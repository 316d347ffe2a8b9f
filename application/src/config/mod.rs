//! Application-level configuration.
//!
//! - [`ExecutionParams`]: concurrency budget, slot wait bound, shutdown timing

pub mod execution_params;

pub use execution_params::{DEFAULT_MAX_CONCURRENT, ExecutionParams};
