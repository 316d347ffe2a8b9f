//! Execution value objects: per-tool and aggregated results
//!
//! These are the shapes handed to API consumers, serialized in camelCase:
//!
//! ```text
//! ExecutionResult { executionId, success, results: [ToolResult], duration,
//!                   metadata: { domain, tools, timestamp, totalResults } }
//! ToolResult      { tool, domain, success, results, count, duration,
//!                   error?, metadata? }
//! ```
//!
//! Two success flags exist on purpose: [`ExecutionResult::success`] says the
//! orchestration ran, [`ToolResult::success`] says one tool produced output.

use crate::core::error::ExecutionError;
use crate::execution::entities::{ExecutionId, OutputSource};
use crate::pipeline::MAX_RAW_OUTPUT_BYTES;
use crate::tool::output_type::OutputType;
use crate::util::clip_output;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Diagnostics attached to a [`ToolResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<OutputType>,
    /// Non-empty lines in the raw output before extraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_line_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_source: Option<OutputSource>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub used_fallback: bool,
    /// Category of the failure (see [`ExecutionError::kind`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Entries dropped by `max_results`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<usize>,
    /// Raw tool output, when requested or when the process failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// Outcome of one tool against one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool: String,
    pub domain: String,
    pub success: bool,
    pub results: Vec<String>,
    /// Always equal to `results.len()`
    pub count: usize,
    /// Milliseconds
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ToolResultMetadata>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(
        tool: impl Into<String>,
        domain: impl Into<String>,
        results: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            tool: tool.into(),
            domain: domain.into(),
            success: true,
            count: results.len(),
            results,
            duration: duration.as_millis() as u64,
            error: None,
            metadata: None,
        }
    }

    /// Create a failed, zero-count result
    pub fn failure(
        tool: impl Into<String>,
        domain: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            tool: tool.into(),
            domain: domain.into(),
            success: false,
            results: Vec::new(),
            count: 0,
            duration: duration.as_millis() as u64,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Failed result for an execution error, carrying diagnostics.
    ///
    /// A non-zero exit keeps whatever the process printed in `raw_output`,
    /// stdout first, clipped to [`MAX_RAW_OUTPUT_BYTES`].
    pub fn from_error(
        tool: impl Into<String>,
        domain: impl Into<String>,
        error: &ExecutionError,
        duration: Duration,
    ) -> Self {
        let mut metadata = ToolResultMetadata {
            error_kind: Some(error.kind().to_string()),
            ..Default::default()
        };
        if let ExecutionError::Process {
            code,
            stdout,
            stderr,
        } = error
        {
            metadata.exit_code = *code;
            let captured = match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
                (true, true) => None,
                (false, true) => Some(stdout.clone()),
                (true, false) => Some(stderr.clone()),
                (false, false) => Some(format!(
                    "{}\n--- stderr ---\n{}",
                    stdout.trim_end(),
                    stderr.trim_end()
                )),
            };
            metadata.raw_output =
                captured.map(|output| clip_output(&output, MAX_RAW_OUTPUT_BYTES));
        }

        Self::failure(tool, domain, error.to_string(), duration).with_metadata(metadata)
    }

    pub fn with_metadata(mut self, metadata: ToolResultMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration.as_millis() as u64;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Context of an aggregated execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    pub domain: String,
    /// Tool names in requested order
    pub tools: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Sum of every tool's `count`
    pub total_results: usize,
}

/// Ordered outcome of one coordinator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    /// The orchestration itself ran (not: every tool succeeded)
    pub success: bool,
    /// One entry per requested tool, in requested order
    pub results: Vec<ToolResult>,
    /// Milliseconds
    pub duration: u64,
    /// Structural failure message, when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ExecutionMetadata,
}

impl ExecutionResult {
    pub fn new(
        execution_id: ExecutionId,
        domain: impl Into<String>,
        tools: Vec<String>,
        results: Vec<ToolResult>,
        duration: Duration,
    ) -> Self {
        let total_results = results.iter().map(|r| r.count).sum();
        Self {
            execution_id,
            success: true,
            results,
            duration: duration.as_millis() as u64,
            error: None,
            metadata: ExecutionMetadata {
                domain: domain.into(),
                tools,
                timestamp: Utc::now(),
                total_results,
            },
        }
    }

    /// The coordinator could not run at all.
    pub fn structural_failure(
        execution_id: ExecutionId,
        domain: impl Into<String>,
        tools: Vec<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let mut result = Self::new(execution_id, domain, tools, Vec::new(), duration);
        result.success = false;
        result.error = Some(error.into());
        result
    }

    pub fn successful_tools(&self) -> impl Iterator<Item = &ToolResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failed_tools(&self) -> impl Iterator<Item = &ToolResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Whether every tool failed, as distinct from the call failing.
    pub fn all_tools_failed(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| !r.success)
    }
}
