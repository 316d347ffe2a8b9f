//! Execution entities: identifiers, requests, options and process lifecycle.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on results returned per tool.
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

/// Unique identifier of one coordinator call or one process attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Per-call options for the result pipeline and the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Maximum results kept per tool after post-processing
    pub max_results: usize,
    /// Remove duplicate entries
    pub deduplicate: bool,
    /// Re-check type-specific syntax on extracted entries
    pub validate: bool,
    /// Sort entries by their type-specific order
    pub sort: bool,
    /// Overrides every tool's declared timeout for this call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Attach raw tool output to each result's metadata
    pub include_raw: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            deduplicate: true,
            validate: true,
            sort: true,
            timeout_ms: None,
            include_raw: false,
        }
    }
}

impl ExecutionOptions {
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn with_deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }

    pub fn with_validate(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    pub fn with_sort(mut self, enabled: bool) -> Self {
        self.sort = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_raw_output(mut self, enabled: bool) -> Self {
        self.include_raw = enabled;
        self
    }
}

/// Input of one coordinator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub tools: Vec<String>,
    pub domain: String,
    #[serde(default)]
    pub options: ExecutionOptions,
}

impl ExecutionRequest {
    pub fn new<I, S>(tools: I, domain: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: tools.into_iter().map(Into::into).collect(),
            domain: domain.into(),
            options: ExecutionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Lifecycle state of a tracked external process.
///
/// ```text
/// Running ──> Completed
///        ├──> TimedOut
///        ├──> Killed
///        └──> Errored
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    Completed,
    TimedOut,
    Killed,
    Errored,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Running => "running",
            ProcessState::Completed => "completed",
            ProcessState::TimedOut => "timed_out",
            ProcessState::Killed => "killed",
            ProcessState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the runner took a tool's output from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSource {
    Stdout,
    OutputFile,
}

/// Raw output of a cleanly exited process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    /// Output file contents if non-empty, otherwise stdout
    pub content: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub source: OutputSource,
    /// The fallback command produced this output
    pub used_fallback: bool,
    pub duration: Duration,
}

impl RawOutput {
    /// Raw output captured from stdout.
    pub fn from_stdout(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            stderr: String::new(),
            exit_code: Some(0),
            source: OutputSource::Stdout,
            used_fallback: false,
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ExecutionId::generate();
        let b = ExecutionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_options_defaults() {
        let options = ExecutionOptions::default();
        assert_eq!(options.max_results, DEFAULT_MAX_RESULTS);
        assert!(options.deduplicate && options.validate && options.sort);
        assert!(options.timeout_override().is_none());
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: ExecutionOptions =
            serde_json::from_str(r#"{"maxResults": 5, "timeoutMs": 1500}"#).unwrap();
        assert_eq!(options.max_results, 5);
        assert_eq!(options.timeout_override(), Some(Duration::from_millis(1500)));
        assert!(options.sort);
    }

    #[test]
    fn test_request_builder() {
        let request = ExecutionRequest::new(["dig", "whois"], "example.com")
            .with_options(ExecutionOptions::default().with_sort(false));
        assert_eq!(request.tools, vec!["dig", "whois"]);
        assert!(!request.options.sort);
    }

    #[test]
    fn test_process_state_terminal() {
        assert!(!ProcessState::Running.is_terminal());
        assert!(ProcessState::TimedOut.is_terminal());
        assert_eq!(ProcessState::TimedOut.to_string(), "timed_out");
    }
}
