//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use subrecon_domain::ToolCategory;

/// Output format for execution results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored per-tool listing
    Text,
    /// The full execution result as JSON
    Json,
}

/// CLI arguments for subrecon
#[derive(Parser, Debug)]
#[command(name = "subrecon")]
#[command(author, version, about = "Run reconnaissance tools against a domain in parallel")]
#[command(long_about = r#"
subrecon runs external reconnaissance tools (subfinder, amass, dig, whois, ...)
against a single domain, at most --max-concurrent at a time, and normalizes
their output into deduplicated, validated and sorted result lists.

A tool that is missing, times out or crashes only fails its own entry; the
others still report.

Configuration files are loaded from (in priority order):
1. SUBRECON_* environment variables   (SUBRECON_EXECUTION__MAX_CONCURRENT=3)
2. --config <path>                    Explicit config file
3. ./subrecon.toml                    Project-level config
4. ~/.config/subrecon/config.toml     Global config

Example:
  subrecon example.com
  subrecon -t subfinder,amass --max-concurrent 2 example.com
  subrecon --category dns -o json example.com
  subrecon --include '^api\.' --analyze example.com
"#)]
pub struct Cli {
    /// Target domain (not required with --list-tools or --show-config)
    pub domain: Option<String>,

    /// Tools to run (repeatable, or comma-separated)
    #[arg(short, long = "tool", value_name = "TOOL", value_delimiter = ',')]
    pub tools: Vec<String>,

    /// Run every tool of a category (subdomain, dns, osint, urls, probe)
    #[arg(long, value_name = "CATEGORY", conflicts_with = "tools")]
    pub category: Option<ToolCategory>,

    /// List the available tools and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Maximum number of tools running at once
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Per-tool timeout in seconds, overriding tool defaults
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum results kept per tool
    #[arg(long, value_name = "N")]
    pub max_results: Option<usize>,

    /// Keep duplicate entries
    #[arg(long)]
    pub no_dedupe: bool,

    /// Skip syntax validation of entries
    #[arg(long)]
    pub no_validate: bool,

    /// Keep tool output order
    #[arg(long)]
    pub no_sort: bool,

    /// Attach raw tool output to each result
    #[arg(long)]
    pub include_raw: bool,

    /// Keep only results matching this regex
    #[arg(long, value_name = "REGEX")]
    pub include: Option<String>,

    /// Drop results matching this regex
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Drop results shorter than this many characters
    #[arg(long, value_name = "N")]
    pub min_length: Option<usize>,

    /// Drop results longer than this many characters
    #[arg(long, value_name = "N")]
    pub max_length: Option<usize>,

    /// Print statistics over the combined results
    #[arg(long)]
    pub analyze: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show the effective configuration and its sources, then exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Whether any post-execution filter flag was given.
    pub fn has_filters(&self) -> bool {
        self.include.is_some()
            || self.exclude.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_repeatable_and_comma_separated() {
        let cli = Cli::try_parse_from([
            "subrecon",
            "-t",
            "subfinder,amass",
            "--tool",
            "dig",
            "example.com",
        ])
        .unwrap();
        assert_eq!(cli.tools, vec!["subfinder", "amass", "dig"]);
        assert_eq!(cli.domain.as_deref(), Some("example.com"));
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_category_parses() {
        let cli = Cli::try_parse_from(["subrecon", "--category", "dns", "example.com"]).unwrap();
        assert_eq!(cli.category, Some(ToolCategory::Dns));

        assert!(Cli::try_parse_from(["subrecon", "--category", "nope", "example.com"]).is_err());
    }

    #[test]
    fn test_category_conflicts_with_tools() {
        let result =
            Cli::try_parse_from(["subrecon", "-t", "dig", "--category", "dns", "example.com"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pipeline_and_filter_flags() {
        let cli = Cli::try_parse_from([
            "subrecon",
            "--no-dedupe",
            "--no-sort",
            "--max-results",
            "50",
            "--timeout",
            "30",
            "--include",
            "^api",
            "-o",
            "json",
            "-vv",
            "example.com",
        ])
        .unwrap();
        assert!(cli.no_dedupe);
        assert!(!cli.no_validate);
        assert!(cli.no_sort);
        assert_eq!(cli.max_results, Some(50));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(cli.has_filters());
    }

    #[test]
    fn test_domain_optional_for_listing() {
        let cli = Cli::try_parse_from(["subrecon", "--list-tools"]).unwrap();
        assert!(cli.list_tools);
        assert!(cli.domain.is_none());
        assert!(!cli.has_filters());
    }
}
