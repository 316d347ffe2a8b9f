//! Execution domain module
//!
//! Requests going into the coordinator and results coming out of it,
//! plus the lifecycle of one tracked external process.
//!
//! - [`ExecutionRequest`] / [`ExecutionOptions`]: what to run, how to post-process
//! - [`ProcessState`]: `Running` then exactly one terminal state
//! - [`RawOutput`]: unparsed output of a cleanly exited process
//! - [`ToolResult`] / [`ExecutionResult`]: typed, ordered results

pub mod entities;
pub mod value_objects;

pub use entities::{
    DEFAULT_MAX_RESULTS, ExecutionId, ExecutionOptions, ExecutionRequest, OutputSource,
    ProcessState, RawOutput,
};
pub use value_objects::{ExecutionMetadata, ExecutionResult, ToolResult, ToolResultMetadata};
