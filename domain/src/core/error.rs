//! Execution error taxonomy
//!
//! Every failure a single tool attempt can hit maps to one variant here.
//! None of them is fatal to a batch: the coordinator turns each into a
//! failed [`ToolResult`](crate::execution::ToolResult) for that tool only.

use thiserror::Error;

/// Failure of a single tool attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Malformed tool name, domain or command template reached the core.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The tool name is not present in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The external binary could not be started.
    #[error("Failed to spawn '{command}': {message}")]
    Spawn { command: String, message: String },

    /// Wall-clock budget exceeded; the process was terminated.
    #[error("Tool timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The process exited with a non-zero status.
    #[error("Process exited with code {}", display_code(.code))]
    Process {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Terminated by a registry kill-all or a stale-process sweep.
    #[error("Process killed: {0}")]
    Killed(String),

    /// The process registry refuses new spawns after shutdown began.
    #[error("Process registry is shutting down")]
    ShuttingDown,

    /// No concurrency slot became free within the configured wait bound.
    #[error("No concurrency slot available after waiting {waited_ms}ms")]
    SlotUnavailable { waited_ms: u64 },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl ExecutionError {
    /// Short machine-readable category, used in logs and metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Validation(_) => "validation",
            ExecutionError::UnknownTool(_) => "unknown_tool",
            ExecutionError::Spawn { .. } => "spawn",
            ExecutionError::Timeout { .. } => "timeout",
            ExecutionError::Process { .. } => "process",
            ExecutionError::Killed(_) => "killed",
            ExecutionError::ShuttingDown => "shutting_down",
            ExecutionError::SlotUnavailable { .. } => "slot_unavailable",
        }
    }

    /// Whether this error should trigger the one-hop fallback.
    ///
    /// Only spawn failures do; a timeout or bad exit status is never retried.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, ExecutionError::Spawn { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_mentions_timeout() {
        let error = ExecutionError::Timeout { timeout_ms: 1500 };
        assert_eq!(error.to_string(), "Tool timed out after 1500ms");
        assert!(error.is_timeout());
    }

    #[test]
    fn test_spawn_display() {
        let error = ExecutionError::Spawn {
            command: "subfinder".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert!(error.to_string().contains("Failed to spawn 'subfinder'"));
    }

    #[test]
    fn test_process_display_without_code() {
        let error = ExecutionError::Process {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(error.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_only_spawn_allows_fallback() {
        let spawn = ExecutionError::Spawn {
            command: "x".into(),
            message: "missing".into(),
        };
        assert!(spawn.allows_fallback());
        assert!(!ExecutionError::Timeout { timeout_ms: 1 }.allows_fallback());
        assert!(!ExecutionError::ShuttingDown.allows_fallback());
        assert!(!ExecutionError::Validation("bad".into()).allows_fallback());
    }

    #[test]
    fn test_kind() {
        assert_eq!(ExecutionError::ShuttingDown.kind(), "shutting_down");
        assert_eq!(ExecutionError::Killed("sweep".into()).kind(), "killed");
    }
}
