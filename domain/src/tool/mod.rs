//! Tool domain module
//!
//! Static descriptions of the external utilities the engine drives.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ ToolCatalog  │───▶│ ToolSpec         │───▶│ RenderedCommand  │
//! │ (registry)   │    │ (template, type) │    │ (program + argv) │
//! └──────────────┘    └────────┬─────────┘    └──────────────────┘
//!                              │
//!                              └─ fallback: one hop, spawn failure only
//! ```
//!
//! # Key Types
//!
//! - [`ToolCatalog`]: read-only map of tool name to [`ToolSpec`]
//! - [`ToolSpec`]: command template, timeout, [`OutputType`], fallback, category
//! - [`CommandTemplate`]: parsed argument template; renders an argv, never a shell string
//! - [`OutputType`]: selects the result pipeline extractor

pub mod entities;
pub mod output_type;
pub mod template;

pub use entities::{FallbackCommand, ToolCatalog, ToolCategory, ToolSpec};
pub use output_type::OutputType;
pub use template::{CommandTemplate, Placeholder, RenderedCommand, TemplateContext, TemplateError};
