//! Progress reporting for tool execution

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard};
use subrecon_application::ExecutionProgress;
use subrecon_domain::{ExecutionResult, ToolResult};

/// Reports progress during execution with a progress bar on stderr
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tool_status(result: &ToolResult) -> String {
        if result.success {
            format!("{} {} ({})", "v".green(), result.tool, result.count)
        } else {
            format!("{} {}", "x".red(), result.tool)
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionProgress for ProgressReporter {
    fn on_execution_start(&self, domain: &str, tools: &[String]) {
        let pb = ProgressBar::new(tools.len() as u64);
        pb.set_style(Self::bar_style());
        pb.set_prefix(domain.to_string());
        pb.set_message("Starting...");
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        *self.bar() = Some(pb);
    }

    fn on_batch_start(&self, index: usize, total: usize, tools: &[String]) {
        if total > 1 {
            if let Some(pb) = self.bar().as_ref() {
                pb.set_message(format!("batch {}/{}: {}", index + 1, total, tools.join(", ")));
            }
        }
    }

    fn on_tool_complete(&self, result: &ToolResult) {
        if let Some(pb) = self.bar().as_ref() {
            pb.set_message(Self::tool_status(result));
            pb.inc(1);
        }
    }

    fn on_execution_complete(&self, result: &ExecutionResult) {
        if let Some(pb) = self.bar().take() {
            pb.finish_with_message(format!(
                "{} ({} results)",
                "complete!".green(),
                result.metadata.total_results
            ));
        }
    }
}

/// Simple line-based progress on stderr (no fancy UI)
///
/// Used with `-v`, where log lines would tear a progress bar.
pub struct SimpleProgress;

impl ExecutionProgress for SimpleProgress {
    fn on_execution_start(&self, domain: &str, tools: &[String]) {
        eprintln!(
            "{} {} ({} tools)",
            "->".cyan(),
            domain.bold(),
            tools.len()
        );
    }

    fn on_batch_start(&self, index: usize, total: usize, tools: &[String]) {
        eprintln!(
            "{} batch {}/{}: {}",
            "->".cyan(),
            index + 1,
            total,
            tools.join(", ")
        );
    }

    fn on_tool_complete(&self, result: &ToolResult) {
        if result.success {
            eprintln!("  {} {} ({} results)", "v".green(), result.tool, result.count);
        } else {
            eprintln!(
                "  {} {} ({})",
                "x".red(),
                result.tool,
                result.error.as_deref().unwrap_or("failed")
            );
        }
    }

    fn on_execution_complete(&self, _result: &ExecutionResult) {
        eprintln!();
    }
}
