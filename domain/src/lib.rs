//! Domain layer for subrecon
//!
//! This crate contains the core types and pure logic of the execution engine.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! A [`ToolSpec`] describes one external utility: a parsed
//! [`CommandTemplate`], a declared timeout, the [`OutputType`] its output is
//! parsed as, and an optional one-hop fallback. The [`ToolCatalog`] maps tool
//! names to specs.
//!
//! ## Execution
//!
//! An [`ExecutionRequest`] names tools and a domain; the coordinator answers
//! with an [`ExecutionResult`] holding one [`ToolResult`] per requested tool,
//! in requested order.
//!
//! ## Result Pipeline
//!
//! [`ResultPipeline`] turns raw process output into a validated, deduplicated,
//! sorted and truncated result list. It never fails; errors become failed
//! [`ToolResult`]s.

pub mod core;
pub mod execution;
pub mod pipeline;
pub mod tool;
pub mod util;
pub mod validation;

// Re-export commonly used types
pub use core::error::ExecutionError;
pub use execution::{
    DEFAULT_MAX_RESULTS, ExecutionId, ExecutionMetadata, ExecutionOptions, ExecutionRequest,
    ExecutionResult, OutputSource, ProcessState, RawOutput, ToolResult, ToolResultMetadata,
};
pub use pipeline::{
    PipelineError, ResultAnalysis, ResultFilter, ResultPipeline, analyze_results, filter_results,
};
pub use tool::{
    CommandTemplate, FallbackCommand, OutputType, Placeholder, RenderedCommand, TemplateContext,
    TemplateError, ToolCatalog, ToolCategory, ToolSpec,
};
pub use validation::{ValidationError, validate_domain, validate_tool_name};
