//! CLI entrypoint for subrecon
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use subrecon_application::{ExecuteToolsUseCase, ExecutionProgress, NoProgress};
use subrecon_domain::{
    ExecutionOptions, ExecutionRequest, ExecutionResult, ResultFilter, ToolCatalog, ToolCategory,
    analyze_results, filter_results, validate_domain, validate_tool_name,
};
use subrecon_infrastructure::{
    ConfigLoader, FileConfig, FilePipelineConfig, LocalProcessRunner, ProcessRegistry,
    build_catalog,
};
use subrecon_presentation::{
    Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress, combined_results,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting subrecon");

    // === Configuration ===
    let config = load_config(&cli)?;

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let catalog = build_catalog(&config.tools).context("Invalid tool configuration")?;

    if cli.list_tools {
        print!("{}", ConsoleFormatter::format_tools(&catalog));
        return Ok(());
    }

    // === Request ===
    let Some(domain) = cli.domain.as_deref() else {
        bail!("A target domain is required. Use --list-tools to see available tools.");
    };
    let domain = validate_domain(domain)?;
    let tools = resolve_tools(&cli, &catalog)?;
    let options = execution_options(&cli, &config.pipeline)?;
    let filter = result_filter(&cli);
    // Reject bad patterns before any tool runs
    filter_results(&[], &filter)?;

    let mut params = config.execution.to_execution_params();
    if let Some(max) = cli.max_concurrent {
        if max == 0 {
            bail!("--max-concurrent must be at least 1");
        }
        params = params.with_max_concurrent(max);
    }

    // === Dependency Injection ===
    let registry = Arc::new(ProcessRegistry::new(params.max_concurrent));
    let sweeper = registry.spawn_sweeper(
        config.execution.sweep_interval(),
        config.execution.sweep_margin(),
    );
    let runner = Arc::new(LocalProcessRunner::new(
        Arc::clone(&registry),
        config.execution.to_runner_config(),
    ));
    let use_case = ExecuteToolsUseCase::new(runner, Arc::new(catalog), params);

    let progress: Box<dyn ExecutionProgress> = if cli.quiet {
        Box::new(NoProgress)
    } else if cli.verbose > 0 {
        Box::new(SimpleProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    let request = ExecutionRequest::new(tools, domain).with_options(options);
    let execution = use_case.execute_with_progress(request, progress.as_ref());
    tokio::pin!(execution);

    // Ctrl-C stops new work and kills running tools; the execution then
    // finishes with whatever the tools produced so far.
    let mut interrupted = false;
    let mut result = loop {
        tokio::select! {
            result = &mut execution => break result,
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                warn!("Interrupted, terminating running tools");
                if !use_case.shutdown().await {
                    error!("Some tool processes did not exit");
                }
            }
        }
    };
    sweeper.abort();

    if cli.has_filters() {
        apply_filter(&mut result, &filter)?;
    }
    let analysis = cli
        .analyze
        .then(|| analyze_results(&combined_results(&result)));

    // Output results
    match cli.output {
        OutputFormat::Text => {
            print!("{}", ConsoleFormatter::format(&result));
            if let Some(analysis) = &analysis {
                print!("{}", ConsoleFormatter::format_analysis(analysis));
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                ConsoleFormatter::format_json(&result, analysis.as_ref())
            );
        }
    }

    if interrupted {
        bail!("Interrupted");
    }
    if let Some(message) = &result.error {
        bail!("{}", message);
    }
    if result.all_tools_failed() {
        bail!("All {} tool(s) failed", result.results.len());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config: {}", e);
        }
        bail!("Invalid configuration: {}", errors[0]);
    }
    Ok(config)
}

/// Tools from `-t`, else every tool of `--category`, else the subdomain set.
fn resolve_tools(cli: &Cli, catalog: &ToolCatalog) -> Result<Vec<String>> {
    if !cli.tools.is_empty() {
        for tool in &cli.tools {
            validate_tool_name(tool)?;
            if !catalog.contains(tool) {
                warn!("Tool '{}' is not in the catalog", tool);
            }
        }
        return Ok(cli.tools.clone());
    }

    let category = cli.category.unwrap_or(ToolCategory::Subdomain);
    let tools: Vec<String> = catalog
        .by_category(category)
        .into_iter()
        .map(|spec| spec.name.clone())
        .collect();
    if tools.is_empty() {
        bail!("No tools configured in category '{}'", category);
    }
    Ok(tools)
}

/// Config `[pipeline]` defaults with CLI flags on top.
fn execution_options(cli: &Cli, pipeline: &FilePipelineConfig) -> Result<ExecutionOptions> {
    let mut options = pipeline.to_execution_options();

    if let Some(max) = cli.max_results {
        if max == 0 {
            bail!("--max-results must be at least 1");
        }
        options = options.with_max_results(max);
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be at least 1 second");
        }
        options = options.with_timeout(Duration::from_secs(secs));
    }
    if cli.no_dedupe {
        options = options.with_deduplicate(false);
    }
    if cli.no_validate {
        options = options.with_validate(false);
    }
    if cli.no_sort {
        options = options.with_sort(false);
    }
    if cli.include_raw {
        options = options.with_raw_output(true);
    }
    Ok(options)
}

fn result_filter(cli: &Cli) -> ResultFilter {
    let mut filter = ResultFilter::new();
    if let Some(pattern) = &cli.include {
        filter = filter.with_include(pattern);
    }
    if let Some(pattern) = &cli.exclude {
        filter = filter.with_exclude(pattern);
    }
    if let Some(min) = cli.min_length {
        filter = filter.with_min_length(min);
    }
    if let Some(max) = cli.max_length {
        filter = filter.with_max_length(max);
    }
    filter
}

/// Narrow every tool's results, keeping counts consistent.
fn apply_filter(result: &mut ExecutionResult, filter: &ResultFilter) -> Result<()> {
    for tool in result.results.iter_mut().filter(|r| r.success) {
        tool.results = filter_results(&tool.results, filter)?;
        tool.count = tool.results.len();
    }
    result.metadata.total_results = result.results.iter().map(|r| r.count).sum();
    Ok(())
}
