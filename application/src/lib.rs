//! Application layer for subrecon
//!
//! This crate contains the execution coordinator, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod concurrency;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use concurrency::ConcurrencySlots;
pub use config::{DEFAULT_MAX_CONCURRENT, ExecutionParams};
pub use ports::{
    process_runner::{Invocation, ProcessRunnerPort},
    progress::{ExecutionProgress, NoProgress},
};
pub use use_cases::execute_tools::{ExecuteToolsUseCase, ExecutorStats};
