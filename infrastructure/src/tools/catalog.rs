//! Built-in tool catalog
//!
//! The table below is the default set of reconnaissance tools. Config
//! `[tools.<name>]` sections can adjust, disable, or add to it through
//! [`build_catalog`].

use crate::config::{ConfigValidationError, FileToolConfig};
use std::collections::BTreeMap;
use std::time::Duration;
use subrecon_domain::{
    CommandTemplate, OutputType, TemplateError, ToolCatalog, ToolCategory, ToolSpec,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("built-in tool '{tool}' has an invalid template: {source}")]
    Template {
        tool: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error(transparent)]
    Config(#[from] ConfigValidationError),
}

struct BuiltinTool {
    name: &'static str,
    description: &'static str,
    program: &'static str,
    args: &'static [&'static str],
    timeout_secs: u64,
    output_type: OutputType,
    category: ToolCategory,
    fallback: Option<(&'static str, &'static [&'static str])>,
}

const BUILTIN_TOOLS: &[BuiltinTool] = &[
    BuiltinTool {
        name: "subfinder",
        description: "Passive subdomain discovery (ProjectDiscovery)",
        program: "subfinder",
        args: &["-d", "{domain}", "-silent"],
        timeout_secs: 300,
        output_type: OutputType::Domains,
        category: ToolCategory::Subdomain,
        fallback: None,
    },
    BuiltinTool {
        name: "assetfinder",
        description: "Find related domains and subdomains",
        program: "assetfinder",
        args: &["--subs-only", "{domain}"],
        timeout_secs: 180,
        output_type: OutputType::Domains,
        category: ToolCategory::Subdomain,
        fallback: None,
    },
    BuiltinTool {
        name: "amass",
        description: "In-depth passive attack surface mapping (OWASP Amass)",
        program: "amass",
        args: &["enum", "-passive", "-d", "{domain}", "-o", "{outputFile}"],
        timeout_secs: 600,
        output_type: OutputType::Domains,
        category: ToolCategory::Subdomain,
        fallback: None,
    },
    BuiltinTool {
        name: "findomain",
        description: "Certificate transparency based subdomain finder",
        program: "findomain",
        args: &["-t", "{domain}", "-q"],
        timeout_secs: 180,
        output_type: OutputType::Domains,
        category: ToolCategory::Subdomain,
        fallback: Some(("findomain-linux", &["-t", "{domain}", "-q"])),
    },
    BuiltinTool {
        name: "chaos",
        description: "ProjectDiscovery Chaos dataset lookup",
        program: "chaos",
        args: &["-d", "{domain}", "-silent"],
        timeout_secs: 120,
        output_type: OutputType::Domains,
        category: ToolCategory::Subdomain,
        fallback: None,
    },
    BuiltinTool {
        name: "crtsh",
        description: "crt.sh certificate transparency search",
        program: "curl",
        args: &[
            "-sS",
            "-f",
            "--max-time",
            "110",
            "https://crt.sh/?q=%25.{domain}&output=json",
        ],
        timeout_secs: 120,
        output_type: OutputType::Domains,
        category: ToolCategory::Subdomain,
        fallback: None,
    },
    BuiltinTool {
        name: "dnsx",
        description: "Fast multi-purpose DNS toolkit",
        program: "dnsx",
        args: &["-d", "{domain}", "-silent"],
        timeout_secs: 180,
        output_type: OutputType::Domains,
        category: ToolCategory::Dns,
        fallback: None,
    },
    BuiltinTool {
        name: "dig",
        description: "DNS answer section lookup",
        program: "dig",
        args: &["+noall", "+answer", "{domain}", "ANY"],
        timeout_secs: 30,
        output_type: OutputType::Text,
        category: ToolCategory::Dns,
        fallback: None,
    },
    BuiltinTool {
        name: "host",
        description: "Simple DNS lookup",
        program: "host",
        args: &["{domain}"],
        timeout_secs: 30,
        output_type: OutputType::Text,
        category: ToolCategory::Dns,
        fallback: None,
    },
    BuiltinTool {
        name: "nslookup",
        description: "Query DNS name servers",
        program: "nslookup",
        args: &["{domain}"],
        timeout_secs: 30,
        output_type: OutputType::Text,
        category: ToolCategory::Dns,
        fallback: None,
    },
    BuiltinTool {
        name: "whois",
        description: "Domain registration lookup",
        program: "whois",
        args: &["{domain}"],
        timeout_secs: 60,
        output_type: OutputType::Text,
        category: ToolCategory::Osint,
        fallback: None,
    },
    BuiltinTool {
        name: "theharvester",
        description: "Email and name harvesting from public sources",
        program: "theharvester",
        args: &["-d", "{domain}", "-b", "crtsh,duckduckgo,rapiddns"],
        timeout_secs: 300,
        output_type: OutputType::Emails,
        category: ToolCategory::Osint,
        fallback: Some((
            "theHarvester",
            &["-d", "{domain}", "-b", "crtsh,duckduckgo,rapiddns"],
        )),
    },
    BuiltinTool {
        name: "waybackurls",
        description: "URLs known to the Wayback Machine",
        program: "waybackurls",
        args: &["{domain}"],
        timeout_secs: 300,
        output_type: OutputType::Urls,
        category: ToolCategory::Urls,
        fallback: None,
    },
    BuiltinTool {
        name: "gau",
        description: "Known URLs from AlienVault OTX, Wayback and Common Crawl",
        program: "gau",
        args: &["--subs", "{domain}"],
        timeout_secs: 300,
        output_type: OutputType::Urls,
        category: ToolCategory::Urls,
        fallback: Some(("getallurls", &["--subs", "{domain}"])),
    },
    BuiltinTool {
        name: "httpx",
        description: "HTTP probe of the target",
        program: "httpx",
        args: &["-u", "{domain}", "-silent"],
        timeout_secs: 120,
        output_type: OutputType::Urls,
        category: ToolCategory::Probe,
        fallback: None,
    },
];

impl BuiltinTool {
    fn to_spec(&self) -> Result<ToolSpec, CatalogError> {
        let template_error = |source| CatalogError::Template {
            tool: self.name,
            source,
        };

        let mut spec = ToolSpec::new(
            self.name,
            CommandTemplate::parse(self.program, self.args.iter().copied())
                .map_err(template_error)?,
        )
        .with_description(self.description)
        .with_timeout(Duration::from_secs(self.timeout_secs))
        .with_output_type(self.output_type)
        .with_category(self.category);

        if let Some((program, args)) = self.fallback {
            spec = spec.with_fallback(
                CommandTemplate::parse(program, args.iter().copied()).map_err(template_error)?,
            );
        }
        Ok(spec)
    }
}

/// The built-in tool specs, in table order.
pub fn builtin_tools() -> Result<Vec<ToolSpec>, CatalogError> {
    BUILTIN_TOOLS.iter().map(BuiltinTool::to_spec).collect()
}

/// Catalog of the built-in tools only.
pub fn builtin_catalog() -> Result<ToolCatalog, CatalogError> {
    build_catalog(&BTreeMap::new())
}

/// Built-in tools with config sections applied on top.
pub fn build_catalog(
    overrides: &BTreeMap<String, FileToolConfig>,
) -> Result<ToolCatalog, CatalogError> {
    let mut specs: BTreeMap<String, ToolSpec> = builtin_tools()?
        .into_iter()
        .map(|spec| (spec.name.clone(), spec))
        .collect();

    for (name, section) in overrides {
        let base = specs.remove(name);
        match section.apply(name, base)? {
            Some(spec) => {
                debug!("Tool '{}' configured from file: {}", name, spec.command);
                specs.insert(name.clone(), spec);
            }
            None => debug!("Tool '{}' disabled by configuration", name),
        }
    }

    Ok(specs
        .into_values()
        .fold(ToolCatalog::new(), |catalog, spec| catalog.register(spec)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.len(), BUILTIN_TOOLS.len());
        for name in ["subfinder", "amass", "dig", "whois", "theharvester", "crtsh", "httpx"] {
            assert!(catalog.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_builtin_fallbacks() {
        let catalog = builtin_catalog().unwrap();
        let harvester = catalog.get("theharvester").unwrap();
        assert_eq!(
            harvester.fallback.as_ref().unwrap().command.program(),
            "theHarvester"
        );
        assert!(catalog.get("dig").unwrap().fallback.is_none());
    }

    #[test]
    fn test_categories() {
        let catalog = builtin_catalog().unwrap();
        let dns: Vec<&str> = catalog
            .by_category(ToolCategory::Dns)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert!(dns.contains(&"dig"));
        assert!(!dns.contains(&"subfinder"));
        assert!(catalog.get("amass").unwrap().command.uses_output_file());
    }

    #[test]
    fn test_crtsh_results_are_domains() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.get("crtsh").unwrap().output_type, OutputType::Domains);
    }

    #[test]
    fn test_overrides_apply() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "whois".to_string(),
            FileToolConfig {
                enabled: false,
                ..Default::default()
            },
        );
        overrides.insert(
            "mytool".to_string(),
            FileToolConfig {
                command: Some("mytool".into()),
                args: Some(vec!["{domain}".into()]),
                ..Default::default()
            },
        );

        let catalog = build_catalog(&overrides).unwrap();
        assert!(!catalog.contains("whois"));
        assert!(catalog.contains("mytool"));
        assert_eq!(catalog.len(), BUILTIN_TOOLS.len());
    }

    #[test]
    fn test_bad_override_is_error() {
        let mut overrides = BTreeMap::new();
        overrides.insert("newtool".to_string(), FileToolConfig::default());
        assert!(matches!(
            build_catalog(&overrides),
            Err(CatalogError::Config(ConfigValidationError::MissingCommand(_)))
        ));
    }
}
