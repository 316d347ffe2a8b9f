//! Tool domain entities

use super::output_type::OutputType;
use super::template::CommandTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Broad purpose of a tool, used for listing and `--category` selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Passive and active subdomain enumeration
    Subdomain,
    /// DNS record lookups and resolution
    Dns,
    /// Open-source intelligence (whois, harvesters)
    Osint,
    /// Historical and crawled URL collection
    Urls,
    /// Liveness probing of discovered hosts
    Probe,
    #[default]
    Other,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Subdomain => "subdomain",
            ToolCategory::Dns => "dns",
            ToolCategory::Osint => "osint",
            ToolCategory::Urls => "urls",
            ToolCategory::Probe => "probe",
            ToolCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subdomain" | "subdomains" => Ok(ToolCategory::Subdomain),
            "dns" => Ok(ToolCategory::Dns),
            "osint" => Ok(ToolCategory::Osint),
            "urls" | "url" => Ok(ToolCategory::Urls),
            "probe" => Ok(ToolCategory::Probe),
            "other" => Ok(ToolCategory::Other),
            other => Err(format!("unknown tool category: {}", other)),
        }
    }
}

/// Alternate command tried once when the primary binary cannot be started.
///
/// Carries only a command template: timeout, output type and category are
/// always the primary's, and a fallback cannot itself have a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCommand {
    pub command: CommandTemplate,
}

impl FallbackCommand {
    pub fn new(command: CommandTemplate) -> Self {
        Self { command }
    }
}

/// Static descriptor of one external tool.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Unique name (e.g., "subfinder")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Program and argument template
    pub command: CommandTemplate,
    /// Declared timeout; `None` means the runner's global default
    pub timeout: Option<Duration>,
    /// Shape of the raw output
    pub output_type: OutputType,
    /// One-hop fallback used only on spawn failure
    pub fallback: Option<FallbackCommand>,
    pub category: ToolCategory,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, command: CommandTemplate) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            command,
            timeout: None,
            output_type: OutputType::default(),
            fallback: None,
            category: ToolCategory::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    pub fn with_fallback(mut self, fallback: CommandTemplate) -> Self {
        self.fallback = Some(FallbackCommand::new(fallback));
        self
    }

    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }
}

/// Read-only registry of the tools the engine can run.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, ToolSpec>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool (builder pattern). A later spec replaces an earlier one.
    pub fn register(mut self, tool: ToolSpec) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Tools of one category, alphabetically.
    pub fn by_category(&self, category: ToolCategory) -> Vec<&ToolSpec> {
        let mut tools: Vec<&ToolSpec> = self
            .tools
            .values()
            .filter(|tool| tool.category == category)
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// All tools, alphabetically.
    pub fn all(&self) -> Vec<&ToolSpec> {
        let mut tools: Vec<&ToolSpec> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
