//! Process Runner port
//!
//! Defines the interface for running one tool invocation as an external
//! process, plus the registry-level controls the coordinator needs for
//! stats and shutdown.

use async_trait::async_trait;
use std::time::Duration;
use subrecon_domain::{ExecutionError, RawOutput, ToolSpec};

/// Per-invocation inputs that are not part of the static [`ToolSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Validated target domain
    pub domain: String,
    /// Overrides the tool's declared timeout
    pub timeout_override: Option<Duration>,
}

impl Invocation {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            timeout_override: None,
        }
    }

    pub fn with_timeout_override(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_override = timeout;
        self
    }
}

/// Port for running external tools
///
/// Implementations (adapters) live in the infrastructure layer. `run`
/// resolves once the process reached a terminal state and was deregistered.
#[async_trait]
pub trait ProcessRunnerPort: Send + Sync {
    /// Run one tool, including its fallback on spawn failure.
    async fn run(
        &self,
        spec: &ToolSpec,
        invocation: &Invocation,
    ) -> Result<RawOutput, ExecutionError>;

    /// Number of processes currently tracked as running.
    fn active_processes(&self) -> usize;

    /// Terminate every tracked process and refuse new spawns.
    ///
    /// Idempotent. Returns how many processes were signalled.
    async fn kill_all(&self) -> usize;

    /// Wait until no process is tracked, or `timeout` elapses.
    ///
    /// Returns whether the runner drained.
    async fn wait_until_idle(&self, timeout: Duration) -> bool;
}
