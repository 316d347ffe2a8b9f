//! Configuration file loading for subrecon
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SUBRECON_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./subrecon.toml`
//! 4. Global: `$XDG_CONFIG_HOME/subrecon/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileExecutionConfig, FileFallbackConfig,
    FilePipelineConfig, FileToolConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
