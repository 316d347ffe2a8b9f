//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ExecutionError`]: failure taxonomy of a single tool attempt

pub mod error;
