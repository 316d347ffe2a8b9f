//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application and domain
//! types after validation.

mod execution;
mod pipeline;
mod tools;

pub use execution::FileExecutionConfig;
pub use pipeline::FilePipelineConfig;
pub use tools::{FileFallbackConfig, FileToolConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("execution.max_concurrent cannot be 0")]
    ZeroConcurrency,

    #[error("{0} cannot be 0")]
    ZeroDuration(&'static str),

    #[error("pipeline.max_results cannot be 0")]
    ZeroMaxResults,

    #[error("invalid tool name '{0}' (expected [A-Za-z0-9_-]+)")]
    InvalidToolName(String),

    #[error("tool '{0}' has no command")]
    MissingCommand(String),

    #[error("tool '{tool}': unknown output_type '{value}'")]
    UnknownOutputType { tool: String, value: String },

    #[error("tool '{tool}': unknown category '{value}'")]
    UnknownCategory { tool: String, value: String },

    #[error("tool '{tool}': invalid command template: {message}")]
    InvalidTemplate { tool: String, message: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Process execution settings
    pub execution: FileExecutionConfig,
    /// Result post-processing defaults
    pub pipeline: FilePipelineConfig,
    /// Tool definitions and overrides, keyed by tool name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, FileToolConfig>,
}

impl FileConfig {
    /// Validate the scalar settings, returning all detected issues.
    ///
    /// Tool sections are checked when the catalog is built, since they
    /// depend on the built-in definitions.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = self.execution.validate();
        errors.extend(self.pipeline.validate());
        errors
    }
}
