//! Console output formatter for execution results

use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use subrecon_domain::{ExecutionResult, ResultAnalysis, ToolCatalog, ToolCategory, ToolResult};

/// JSON document printed by `-o json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    execution: &'a ExecutionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<&'a ResultAnalysis>,
}

/// Formats execution results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete execution result
    pub fn format(result: &ExecutionResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Recon Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Domain:".cyan().bold(),
            result.metadata.domain
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Tools:".cyan().bold(),
            result.metadata.tools.join(", ")
        ));

        if let Some(error) = &result.error {
            output.push_str(&format!("\n{} {}\n", "Error:".red().bold(), error));
            output.push_str(&Self::footer());
            return output;
        }

        for tool in &result.results {
            output.push_str(&Self::tool_section(tool));
        }

        let succeeded = result.successful_tools().count();
        output.push_str(&Self::section_header("Summary"));
        output.push_str(&format!(
            "{} tool(s) succeeded, {} failed, {} result(s) in {}ms\n",
            succeeded.to_string().green(),
            (result.results.len() - succeeded).to_string().red(),
            result.metadata.total_results,
            result.duration
        ));

        output.push_str(&Self::footer());
        output
    }

    fn tool_section(tool: &ToolResult) -> String {
        let mut output = String::new();

        if tool.success {
            let title = format!(
                "── {} ({} result(s), {}ms) ──",
                tool.tool, tool.count, tool.duration
            );
            output.push_str(&format!("\n{}\n", title.yellow().bold()));
            for entry in &tool.results {
                output.push_str(&format!("  {}\n", entry));
            }
            if let Some(dropped) = tool.metadata.as_ref().and_then(|m| m.truncated) {
                output.push_str(&format!(
                    "  {}\n",
                    format!("... {} more dropped by max_results", dropped).dimmed()
                ));
            }
        } else {
            let title = format!("── {} ({}ms) ──", tool.tool, tool.duration);
            output.push_str(&format!(
                "\n{}\n  Error: {}\n",
                title.red().bold(),
                tool.error.as_deref().unwrap_or("Unknown")
            ));
        }

        if let Some(raw) = tool.metadata.as_ref().and_then(|m| m.raw_output.as_deref()) {
            output.push_str(&format!("  {}\n", "Raw output:".dimmed()));
            output.push_str(&Self::indent(raw, "    | "));
            output.push('\n');
        }
        output
    }

    /// Format as JSON, with the analysis attached when present
    pub fn format_json(result: &ExecutionResult, analysis: Option<&ResultAnalysis>) -> String {
        let report = JsonReport {
            execution: result,
            analysis,
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format result statistics
    pub fn format_analysis(analysis: &ResultAnalysis) -> String {
        let mut output = Self::section_header("Analysis");

        output.push_str(&format!(
            "{} {} ({} unique)\n",
            "Results:".cyan().bold(),
            analysis.count,
            analysis.unique
        ));
        output.push_str(&format!(
            "{} min {}, max {}, average {:.1}\n",
            "Length:".cyan().bold(),
            analysis.length.min,
            analysis.length.max,
            analysis.length.average
        ));
        for (bucket, count) in &analysis.length.distribution {
            output.push_str(&format!("  {:>9}  {}\n", bucket, count));
        }

        if !analysis.tlds.is_empty() {
            output.push_str(&format!("{}\n", "TLDs:".cyan().bold()));
            for (tld, count) in &analysis.tlds {
                output.push_str(&format!("  .{:<8} {}\n", tld, count));
            }
        }
        if !analysis.subnets.is_empty() {
            output.push_str(&format!("{}\n", "Subnets:".cyan().bold()));
            for (subnet, count) in &analysis.subnets {
                output.push_str(&format!("  {:<18} {}\n", subnet, count));
            }
        }
        output
    }

    /// List catalog tools grouped by category
    pub fn format_tools(catalog: &ToolCatalog) -> String {
        let mut output = Self::header("Available Tools");
        output.push('\n');

        let categories = [
            ToolCategory::Subdomain,
            ToolCategory::Dns,
            ToolCategory::Osint,
            ToolCategory::Urls,
            ToolCategory::Probe,
            ToolCategory::Other,
        ];
        for category in categories {
            let tools = catalog.by_category(category);
            if tools.is_empty() {
                continue;
            }
            output.push_str(&Self::section_header(category.as_str()));
            for tool in tools {
                let fallback = tool
                    .fallback
                    .as_ref()
                    .map(|f| format!(" (fallback: {})", f.command.program()))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "  {} {:<8} {}{}\n",
                    format!("{:<14}", tool.name).bold(),
                    tool.output_type.as_str(),
                    tool.description,
                    fallback.dimmed()
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Results of every successful tool, first occurrence order, duplicates removed.
pub fn combined_results(result: &ExecutionResult) -> Vec<String> {
    let mut seen = HashSet::new();
    result
        .successful_tools()
        .flat_map(|tool| tool.results.iter())
        .filter(|entry| seen.insert(entry.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use subrecon_domain::{CommandTemplate, ExecutionId, OutputType, ToolSpec, analyze_results};

    fn sample() -> ExecutionResult {
        let ok = ToolResult::success(
            "subfinder",
            "example.com",
            vec!["a.example.com".into(), "b.example.com".into()],
            Duration::from_millis(40),
        );
        let other = ToolResult::success(
            "assetfinder",
            "example.com",
            vec!["b.example.com".into(), "c.example.com".into()],
            Duration::from_millis(60),
        );
        let failed = ToolResult::failure(
            "amass",
            "example.com",
            "Failed to spawn process: amass not found",
            Duration::from_millis(1),
        );
        ExecutionResult::new(
            ExecutionId::new("exec-1"),
            "example.com",
            vec!["subfinder".into(), "assetfinder".into(), "amass".into()],
            vec![ok, other, failed],
            Duration::from_millis(70),
        )
    }

    #[test]
    fn test_text_lists_every_tool() {
        let text = ConsoleFormatter::format(&sample());
        assert!(text.contains("example.com"));
        assert!(text.contains("a.example.com"));
        assert!(text.contains("amass not found"));
        assert!(text.contains("4 result(s)"));
    }

    #[test]
    fn test_text_structural_failure() {
        let result = ExecutionResult::structural_failure(
            ExecutionId::new("exec-2"),
            "example.com",
            Vec::new(),
            "No tools requested",
            Duration::ZERO,
        );
        let text = ConsoleFormatter::format(&result);
        assert!(text.contains("No tools requested"));
        assert!(!text.contains("Summary"));
    }

    #[test]
    fn test_json_is_camel_case_and_carries_analysis() {
        let result = sample();
        let analysis = analyze_results(&combined_results(&result));
        let json = ConsoleFormatter::format_json(&result, Some(&analysis));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["executionId"], "exec-1");
        assert_eq!(value["results"][0]["tool"], "subfinder");
        assert_eq!(value["metadata"]["totalResults"], 4);
        assert_eq!(value["analysis"]["unique"], 3);

        let without: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&result, None)).unwrap();
        assert!(without.get("analysis").is_none());
    }

    #[test]
    fn test_combined_results_dedupes_in_order() {
        assert_eq!(
            combined_results(&sample()),
            vec!["a.example.com", "b.example.com", "c.example.com"]
        );
    }

    #[test]
    fn test_format_tools_groups_by_category() {
        let catalog = ToolCatalog::new()
            .register(
                ToolSpec::new("dig", CommandTemplate::parse("dig", ["{domain}"]).unwrap())
                    .with_category(ToolCategory::Dns)
                    .with_description("DNS lookup"),
            )
            .register(
                ToolSpec::new(
                    "subfinder",
                    CommandTemplate::parse("subfinder", ["-d", "{domain}"]).unwrap(),
                )
                .with_output_type(OutputType::Domains)
                .with_category(ToolCategory::Subdomain),
            );
        let text = ConsoleFormatter::format_tools(&catalog);
        let subdomain_at = text.find("subdomain").unwrap();
        let dns_at = text.find("DNS lookup").unwrap();
        assert!(subdomain_at < dns_at);
        assert!(!text.contains("osint"));
    }

    #[test]
    fn test_format_analysis() {
        let analysis = analyze_results(&["10.0.0.1".to_string(), "a.example.com".to_string()]);
        let text = ConsoleFormatter::format_analysis(&analysis);
        assert!(text.contains("10.0.0.0/24"));
        assert!(text.contains(".com"));
    }
}
