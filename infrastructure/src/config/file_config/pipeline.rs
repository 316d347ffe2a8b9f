//! Result pipeline configuration from TOML (`[pipeline]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use subrecon_domain::{DEFAULT_MAX_RESULTS, ExecutionOptions};

/// Raw pipeline configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub max_results: usize,
    pub deduplicate: bool,
    pub validate: bool,
    pub sort: bool,
    /// Attach raw tool output to every result
    pub include_raw: bool,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            deduplicate: true,
            validate: true,
            sort: true,
            include_raw: false,
        }
    }
}

impl FilePipelineConfig {
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        if self.max_results == 0 {
            vec![ConfigValidationError::ZeroMaxResults]
        } else {
            Vec::new()
        }
    }

    pub fn to_execution_options(&self) -> ExecutionOptions {
        ExecutionOptions::default()
            .with_max_results(self.max_results)
            .with_deduplicate(self.deduplicate)
            .with_validate(self.validate)
            .with_sort(self.sort)
            .with_raw_output(self.include_raw)
    }
}
