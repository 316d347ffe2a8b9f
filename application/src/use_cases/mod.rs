//! Use cases (application services)
//!
//! - [`execute_tools`]: the execution coordinator

pub mod execute_tools;
