//! Output type value object

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Declared shape of a tool's raw output.
///
/// Selects which extractor the result pipeline applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// One (sub)domain per line, possibly surrounded by noise
    Domains,
    /// Anything containing http(s) URLs
    Urls,
    /// Anything containing email addresses
    Emails,
    /// IPv4 addresses, one or more per line
    Ips,
    /// A JSON document or JSON lines
    Json,
    /// Plain lines, kept as-is (default)
    #[default]
    Text,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Domains => "domains",
            OutputType::Urls => "urls",
            OutputType::Emails => "emails",
            OutputType::Ips => "ips",
            OutputType::Json => "json",
            OutputType::Text => "text",
        }
    }
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domains" | "domain" | "subdomains" => Ok(OutputType::Domains),
            "urls" | "url" => Ok(OutputType::Urls),
            "emails" | "email" => Ok(OutputType::Emails),
            "ips" | "ip" => Ok(OutputType::Ips),
            "json" => Ok(OutputType::Json),
            "text" | "raw" => Ok(OutputType::Text),
            other => Err(format!("unknown output type: {}", other)),
        }
    }
}
