//! Execution configuration from TOML (`[execution]` section)
//!
//! ```toml
//! [execution]
//! max_concurrent = 5
//! default_timeout_secs = 300
//! kill_grace_secs = 5
//! sweep_interval_secs = 30
//! sweep_margin_secs = 30
//! slot_wait_timeout_secs = 600   # 0 waits forever
//! output_dir = "/tmp/subrecon"
//! env_allowlist = ["PATH", "HOME", "USER", "LANG", "TMPDIR", "GOPATH"]
//! ```

use super::ConfigValidationError;
use crate::process::runner::{DEFAULT_ENV_ALLOWLIST, RunnerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use subrecon_application::ExecutionParams;

/// Raw execution configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub max_concurrent: usize,
    pub default_timeout_secs: u64,
    pub kill_grace_secs: u64,
    pub sweep_interval_secs: u64,
    /// Added to a process's timeout before the sweep treats it as stale
    pub sweep_margin_secs: u64,
    /// Longest wait for a concurrency slot; 0 means no bound
    pub slot_wait_timeout_secs: u64,
    /// Directory for tool output files (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub env_allowlist: Vec<String>,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            default_timeout_secs: 300,
            kill_grace_secs: 5,
            sweep_interval_secs: 30,
            sweep_margin_secs: 30,
            slot_wait_timeout_secs: 600,
            output_dir: None,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FileExecutionConfig {
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        if self.max_concurrent == 0 {
            errors.push(ConfigValidationError::ZeroConcurrency);
        }
        if self.default_timeout_secs == 0 {
            errors.push(ConfigValidationError::ZeroDuration(
                "execution.default_timeout_secs",
            ));
        }
        if self.sweep_interval_secs == 0 {
            errors.push(ConfigValidationError::ZeroDuration(
                "execution.sweep_interval_secs",
            ));
        }
        errors
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn sweep_margin(&self) -> Duration {
        Duration::from_secs(self.sweep_margin_secs)
    }

    pub fn to_execution_params(&self) -> ExecutionParams {
        let slot_wait = (self.slot_wait_timeout_secs > 0)
            .then(|| Duration::from_secs(self.slot_wait_timeout_secs));

        ExecutionParams::default()
            .with_max_concurrent(self.max_concurrent)
            .with_slot_wait_timeout(slot_wait)
            .with_kill_grace(Duration::from_secs(self.kill_grace_secs))
    }

    pub fn to_runner_config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::default()
            .with_default_timeout(Duration::from_secs(self.default_timeout_secs))
            .with_kill_grace(Duration::from_secs(self.kill_grace_secs))
            .with_env_allowlist(self.env_allowlist.iter().cloned());
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        config
    }
}
