//! Execute Tools use case
//!
//! The execution coordinator: runs a list of tools against one domain in
//! concurrency-bounded batches and assembles an ordered [`ExecutionResult`].
//!
//! ```text
//! tools ──chunks(max_concurrent)──> batch 1 ──> batch 2 ──> ...
//!                                     │
//!                     ┌───────────────┼───────────────┐
//!                     ▼               ▼               ▼
//!                  slot+run        slot+run        slot+run
//!                  pipeline        pipeline        pipeline
//!                     └───────────────┴───────────────┘
//!                         results[i].tool == tools[i]
//! ```
//!
//! A failing tool (unknown name, spawn failure, timeout, non-zero exit,
//! panic) only produces a failed [`ToolResult`] for itself.

use crate::concurrency::ConcurrencySlots;
use crate::config::ExecutionParams;
use crate::ports::process_runner::{Invocation, ProcessRunnerPort};
use crate::ports::progress::{ExecutionProgress, NoProgress};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use subrecon_domain::{
    ExecutionError, ExecutionId, ExecutionOptions, ExecutionRequest, ExecutionResult,
    ResultPipeline, ToolCatalog, ToolResult, validate_tool_name,
};
use tracing::{debug, info, warn};

/// Snapshot of coordinator load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorStats {
    /// Processes tracked as running by the runner
    pub active_processes: usize,
    /// Concurrency slots currently held
    pub concurrent_executions: usize,
    pub max_concurrent: usize,
}

/// Everything one spawned tool task needs, cloned per task.
struct ToolTask<R: ProcessRunnerPort + 'static> {
    runner: Arc<R>,
    catalog: Arc<ToolCatalog>,
    pipeline: Arc<ResultPipeline>,
    slots: ConcurrencySlots,
    slot_wait: Option<Duration>,
    tool: String,
    domain: String,
    options: ExecutionOptions,
}

impl<R: ProcessRunnerPort + 'static> ToolTask<R> {
    async fn run(self) -> ToolResult {
        let started = Instant::now();
        let fail = |error: ExecutionError, started: Instant| {
            ToolResult::from_error(&self.tool, &self.domain, &error, started.elapsed())
        };

        if let Err(e) = validate_tool_name(&self.tool) {
            return fail(ExecutionError::Validation(e.to_string()), started);
        }
        let Some(spec) = self.catalog.get(&self.tool) else {
            return fail(ExecutionError::UnknownTool(self.tool.clone()), started);
        };

        let permit = match self.slots.acquire(self.slot_wait).await {
            Ok(permit) => permit,
            Err(e) => return fail(e, started),
        };

        let started = Instant::now();
        let invocation =
            Invocation::new(&self.domain).with_timeout_override(self.options.timeout_override());
        let outcome = self.runner.run(spec, &invocation).await;
        drop(permit);

        match outcome {
            Ok(raw) => self
                .pipeline
                .process(spec, &raw, &self.domain, &self.options)
                .with_duration(started.elapsed()),
            Err(e) => fail(e, started),
        }
    }
}

/// Use case for running tools against a domain
pub struct ExecuteToolsUseCase<R: ProcessRunnerPort + 'static> {
    runner: Arc<R>,
    catalog: Arc<ToolCatalog>,
    pipeline: Arc<ResultPipeline>,
    slots: ConcurrencySlots,
    params: ExecutionParams,
}

impl<R: ProcessRunnerPort + 'static> ExecuteToolsUseCase<R> {
    /// Create a coordinator owning a fresh budget of `params.max_concurrent` slots.
    pub fn new(runner: Arc<R>, catalog: Arc<ToolCatalog>, params: ExecutionParams) -> Self {
        Self {
            runner,
            catalog,
            pipeline: Arc::new(ResultPipeline::new()),
            slots: ConcurrencySlots::new(params.max_concurrent),
            params,
        }
    }

    /// Share an existing budget instead of owning one.
    pub fn with_slots(mut self, slots: ConcurrencySlots) -> Self {
        self.params.max_concurrent = slots.max();
        self.slots = slots;
        self
    }

    pub fn with_pipeline(mut self, pipeline: ResultPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        self.execute_with_progress(request, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        request: ExecutionRequest,
        progress: &dyn ExecutionProgress,
    ) -> ExecutionResult {
        let execution_id = ExecutionId::generate();
        let started = Instant::now();
        let ExecutionRequest {
            tools,
            domain,
            options,
        } = request;

        if tools.is_empty() {
            warn!("Execution {} rejected: no tools requested", execution_id);
            return ExecutionResult::structural_failure(
                execution_id,
                domain,
                tools,
                "No tools requested",
                started.elapsed(),
            );
        }
        if domain.trim().is_empty() {
            warn!("Execution {} rejected: empty domain", execution_id);
            return ExecutionResult::structural_failure(
                execution_id,
                domain,
                tools,
                "Domain cannot be empty",
                started.elapsed(),
            );
        }

        let batch_size = self.slots.max();
        let batches: Vec<&[String]> = tools.chunks(batch_size).collect();
        info!(
            "Execution {}: {} tool(s) against {} in {} batch(es)",
            execution_id,
            tools.len(),
            domain,
            batches.len()
        );
        progress.on_execution_start(&domain, &tools);

        let mut results = Vec::with_capacity(tools.len());
        for (index, batch) in batches.iter().enumerate() {
            debug!("Batch {}/{}: {:?}", index + 1, batches.len(), batch);
            progress.on_batch_start(index, batches.len(), batch);
            results.extend(self.run_batch(batch, &domain, &options, progress).await);
        }

        let result = ExecutionResult::new(execution_id, domain, tools, results, started.elapsed());
        info!(
            "Execution {} finished in {}ms: {} succeeded, {} failed, {} result(s)",
            result.execution_id,
            result.duration,
            result.successful_tools().count(),
            result.failed_tools().count(),
            result.metadata.total_results
        );
        progress.on_execution_complete(&result);
        result
    }

    /// Run one batch in parallel, returning results in batch order.
    async fn run_batch(
        &self,
        batch: &[String],
        domain: &str,
        options: &ExecutionOptions,
        progress: &dyn ExecutionProgress,
    ) -> Vec<ToolResult> {
        let batch_started = Instant::now();
        let mut pending: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(offset, tool)| {
                let task = ToolTask {
                    runner: Arc::clone(&self.runner),
                    catalog: Arc::clone(&self.catalog),
                    pipeline: Arc::clone(&self.pipeline),
                    slots: self.slots.clone(),
                    slot_wait: self.params.slot_wait_timeout,
                    tool: tool.clone(),
                    domain: domain.to_string(),
                    options: options.clone(),
                };
                let handle = tokio::spawn(task.run());
                async move { (offset, handle.await) }
            })
            .collect();

        let mut slots: Vec<Option<ToolResult>> = vec![None; batch.len()];
        while let Some((offset, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Tool task for {} did not complete: {}", batch[offset], e);
                    ToolResult::failure(
                        &batch[offset],
                        domain,
                        format!("Tool task failed: {}", e),
                        batch_started.elapsed(),
                    )
                }
            };

            if result.success {
                info!(
                    "Tool {} succeeded with {} result(s) in {}ms",
                    result.tool, result.count, result.duration
                );
            } else {
                warn!(
                    "Tool {} failed: {}",
                    result.tool,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            progress.on_tool_complete(&result);
            slots[offset] = Some(result);
        }

        slots
            .into_iter()
            .zip(batch)
            .map(|(result, tool)| {
                result.unwrap_or_else(|| {
                    ToolResult::failure(tool, domain, "Tool task lost", batch_started.elapsed())
                })
            })
            .collect()
    }

    /// Terminate every running tool process. Returns how many were signalled.
    pub async fn kill_all_processes(&self) -> usize {
        let killed = self.runner.kill_all().await;
        info!("Killed {} running process(es)", killed);
        killed
    }

    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            active_processes: self.runner.active_processes(),
            concurrent_executions: self.slots.in_use(),
            max_concurrent: self.slots.max(),
        }
    }

    /// Stop accepting work, kill running processes and wait for them to exit.
    ///
    /// Safe to call while executions are in flight: their remaining tools
    /// finish with failed results. Returns whether every process exited
    /// within the shutdown bound.
    pub async fn shutdown(&self) -> bool {
        info!("Shutting down execution coordinator");
        self.slots.close();
        self.kill_all_processes().await;

        let drained = self.runner.wait_until_idle(self.params.shutdown_wait()).await;
        if !drained {
            warn!(
                "{} process(es) still running after {:?}",
                self.runner.active_processes(),
                self.params.shutdown_wait()
            );
        }
        drained
    }
}
