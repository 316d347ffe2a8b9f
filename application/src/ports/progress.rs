//! Progress notification port
//!
//! Defines the interface for reporting progress while tools execute.

use subrecon_domain::{ExecutionResult, ToolResult};

/// Callback for progress updates during tool execution
///
/// Implementations live in the presentation layer. Every method has a no-op
/// default so reporters only implement what they display.
pub trait ExecutionProgress: Send + Sync {
    /// Called once before the first batch starts
    fn on_execution_start(&self, _domain: &str, _tools: &[String]) {}

    /// Called when a batch is dispatched (`index` is zero-based)
    fn on_batch_start(&self, _index: usize, _total: usize, _tools: &[String]) {}

    /// Called as soon as a tool reaches its terminal result
    fn on_tool_complete(&self, _result: &ToolResult) {}

    /// Called once with the assembled result
    fn on_execution_complete(&self, _result: &ExecutionResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ExecutionProgress for NoProgress {}
