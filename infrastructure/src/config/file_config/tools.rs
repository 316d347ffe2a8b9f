//! Tool definitions from TOML (`[tools.<name>]` sections)
//!
//! A section either defines a new tool or adjusts a built-in one. Fields
//! left out keep the built-in value; a new tool must at least set `command`.
//!
//! ```toml
//! [tools.mytool]
//! command = "mytool"
//! args = ["-d", "{domain}", "-o", "{outputFile}"]
//! timeout_secs = 120
//! output_type = "domains"
//! category = "subdomain"
//! fallback = { command = "mytool-legacy", args = ["{domain}"] }
//!
//! [tools.amass]
//! timeout_secs = 900     # only raise the built-in timeout
//!
//! [tools.whois]
//! enabled = false        # drop a built-in tool
//! ```

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use subrecon_domain::{CommandTemplate, OutputType, ToolCategory, ToolSpec, validate_tool_name};

/// Fallback command of a configured tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFallbackConfig {
    pub command: String,
    pub args: Vec<String>,
}

/// Raw tool configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolConfig {
    /// Set to false to remove the tool from the catalog
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// One of domains, urls, emails, ips, json, text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FileFallbackConfig>,
}

impl Default for FileToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            args: None,
            description: None,
            timeout_secs: None,
            output_type: None,
            category: None,
            fallback: None,
        }
    }
}

fn template_error(tool: &str, e: impl std::fmt::Display) -> ConfigValidationError {
    ConfigValidationError::InvalidTemplate {
        tool: tool.to_string(),
        message: e.to_string(),
    }
}

impl FileToolConfig {
    /// Apply this section to `base` (the built-in spec, if any).
    ///
    /// Returns `Ok(None)` when the tool is disabled.
    pub fn apply(
        &self,
        name: &str,
        base: Option<ToolSpec>,
    ) -> Result<Option<ToolSpec>, ConfigValidationError> {
        validate_tool_name(name)
            .map_err(|_| ConfigValidationError::InvalidToolName(name.to_string()))?;
        if !self.enabled {
            return Ok(None);
        }

        let command = match (&self.command, &base) {
            (Some(program), _) => {
                let args = self.args.clone().unwrap_or_default();
                CommandTemplate::parse(program.as_str(), args)
                    .map_err(|e| template_error(name, e))?
            }
            (None, Some(spec)) => match &self.args {
                Some(args) => CommandTemplate::parse(spec.command.program(), args.iter().cloned())
                    .map_err(|e| template_error(name, e))?,
                None => spec.command.clone(),
            },
            (None, None) => return Err(ConfigValidationError::MissingCommand(name.to_string())),
        };

        let mut spec = match base {
            Some(mut spec) => {
                spec.command = command;
                spec
            }
            None => ToolSpec::new(name, command),
        };

        if let Some(description) = &self.description {
            spec.description = description.clone();
        }
        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err(ConfigValidationError::ZeroDuration("tools.*.timeout_secs"));
            }
            spec.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(value) = &self.output_type {
            spec.output_type = value.parse::<OutputType>().map_err(|_| {
                ConfigValidationError::UnknownOutputType {
                    tool: name.to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = &self.category {
            spec.category = value.parse::<ToolCategory>().map_err(|_| {
                ConfigValidationError::UnknownCategory {
                    tool: name.to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(fallback) = &self.fallback {
            if fallback.command.trim().is_empty() {
                return Err(ConfigValidationError::MissingCommand(format!(
                    "{} (fallback)",
                    name
                )));
            }
            let template = CommandTemplate::parse(fallback.command.as_str(), fallback.args.clone())
                .map_err(|e| template_error(name, e))?;
            spec = spec.with_fallback(template);
        }

        Ok(Some(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ToolSpec {
        ToolSpec::new(
            "amass",
            CommandTemplate::parse("amass", ["enum", "-d", "{domain}"]).unwrap(),
        )
        .with_output_type(OutputType::Domains)
        .with_category(ToolCategory::Subdomain)
    }

    #[test]
    fn test_new_tool_requires_command() {
        let config = FileToolConfig::default();
        assert_eq!(
            config.apply("mytool", None).unwrap_err(),
            ConfigValidationError::MissingCommand("mytool".into())
        );
    }

    #[test]
    fn test_define_new_tool() {
        let config = FileToolConfig {
            command: Some("mytool".into()),
            args: Some(vec!["-d".into(), "{domain}".into(), "-o".into(), "{outputFile}".into()]),
            timeout_secs: Some(120),
            output_type: Some("domains".into()),
            category: Some("subdomain".into()),
            fallback: Some(FileFallbackConfig {
                command: "mytool-legacy".into(),
                args: vec!["{domain}".into()],
            }),
            ..Default::default()
        };
        let spec = config.apply("mytool", None).unwrap().unwrap();

        assert_eq!(spec.command.program(), "mytool");
        assert!(spec.command.uses_output_file());
        assert_eq!(spec.timeout, Some(Duration::from_secs(120)));
        assert_eq!(spec.output_type, OutputType::Domains);
        assert_eq!(spec.category, ToolCategory::Subdomain);
        assert_eq!(
            spec.fallback.unwrap().command.program(),
            "mytool-legacy"
        );
    }

    #[test]
    fn test_partial_override_keeps_builtin() {
        let config = FileToolConfig {
            timeout_secs: Some(900),
            ..Default::default()
        };
        let spec = config.apply("amass", Some(base())).unwrap().unwrap();
        assert_eq!(spec.timeout, Some(Duration::from_secs(900)));
        assert_eq!(spec.command, base().command);
        assert_eq!(spec.output_type, OutputType::Domains);
    }

    #[test]
    fn test_disabled_tool() {
        let config = FileToolConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(config.apply("amass", Some(base())).unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let unknown_type = FileToolConfig {
            output_type: Some("xml".into()),
            ..Default::default()
        };
        assert!(matches!(
            unknown_type.apply("amass", Some(base())),
            Err(ConfigValidationError::UnknownOutputType { .. })
        ));

        let bad_placeholder = FileToolConfig {
            command: Some("x".into()),
            args: Some(vec!["{target}".into()]),
            ..Default::default()
        };
        assert!(matches!(
            bad_placeholder.apply("x", None),
            Err(ConfigValidationError::InvalidTemplate { .. })
        ));

        assert!(matches!(
            FileToolConfig::default().apply("bad name", Some(base())),
            Err(ConfigValidationError::InvalidToolName(_))
        ));
    }
}
