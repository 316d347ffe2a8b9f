//! Local process execution
//!
//! ```text
//! LocalProcessRunner ──register──> ProcessRegistry <──sweep── sweeper task
//!        │                             │
//!        ├─ OutputFile (temp path)     └─ kill_all() on shutdown
//!        └─ signal_group (SIGTERM/SIGKILL)
//! ```

pub mod output_file;
pub mod registry;
pub mod runner;
pub mod signal;

pub use output_file::OutputFile;
pub use registry::{ProcessHandle, ProcessRegistry, RegistrationGuard, RegistryStats};
pub use runner::{DEFAULT_ENV_ALLOWLIST, LocalProcessRunner, RunnerConfig};
pub use signal::{Signal, group_alive, signal_group, signal_members};
