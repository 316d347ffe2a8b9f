//! Execution parameters: coordinator control.
//!
//! [`ExecutionParams`] groups the static parameters that control how
//! [`ExecuteToolsUseCase`](crate::use_cases::execute_tools::ExecuteToolsUseCase)
//! schedules tools. Per-call knobs live in
//! [`ExecutionOptions`](subrecon_domain::ExecutionOptions) instead.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of tools allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Coordinator control parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Global concurrency budget; also the batch size.
    pub max_concurrent: usize,
    /// Longest a tool waits for a free slot. `None` waits forever.
    pub slot_wait_timeout: Option<Duration>,
    /// Time between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
    /// Extra time shutdown waits for the registry to drain, on top of `kill_grace`.
    pub shutdown_margin: Duration,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            slot_wait_timeout: Some(Duration::from_secs(600)),
            kill_grace: Duration::from_secs(5),
            shutdown_margin: Duration::from_secs(2),
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_slot_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.slot_wait_timeout = timeout;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn with_shutdown_margin(mut self, margin: Duration) -> Self {
        self.shutdown_margin = margin;
        self
    }

    /// Upper bound on how long shutdown waits for processes to exit.
    pub fn shutdown_wait(&self) -> Duration {
        self.kill_grace + self.shutdown_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_concurrent, 5);
        assert_eq!(params.slot_wait_timeout, Some(Duration::from_secs(600)));
        assert_eq!(params.shutdown_wait(), Duration::from_secs(7));
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_concurrent(2)
            .with_slot_wait_timeout(None)
            .with_kill_grace(Duration::from_millis(100));

        assert_eq!(params.max_concurrent, 2);
        assert!(params.slot_wait_timeout.is_none());
        assert_eq!(params.kill_grace, Duration::from_millis(100));
    }
}
