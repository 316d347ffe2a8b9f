//! Local process runner: executes tools as child processes.
//!
//! One call to [`LocalProcessRunner::run`] is one or two attempts:
//!
//! ```text
//! attempt(primary) ──Spawn error──> attempt(fallback)   (one hop, fresh budget)
//!        │
//!        ├─ exit 0      → RawOutput (output file if non-empty, else stdout)
//!        ├─ exit != 0   → ExecutionError::Process
//!        │   (either exit: leftover group members get SIGTERM, grace, SIGKILL)
//!        ├─ timeout     → SIGTERM, grace, SIGKILL → ExecutionError::Timeout
//!        └─ cancelled   → SIGTERM, grace, SIGKILL → ExecutionError::Killed
//! ```
//!
//! Arguments are passed as a vector, never through a shell. The child gets a
//! cleared environment plus an allow-list, a closed stdin, and its own
//! process group.

use super::output_file::OutputFile;
use super::registry::{ProcessHandle, ProcessRegistry, RegistrationGuard};
use super::signal::{Signal, group_alive, signal_group, signal_members};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use subrecon_application::ports::process_runner::{Invocation, ProcessRunnerPort};
use subrecon_domain::{
    CommandTemplate, ExecutionError, ExecutionId, OutputSource, ProcessState, RawOutput,
    TemplateContext, ToolSpec,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often a finished tool's process group is checked for survivors.
const GROUP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Environment variables passed through to tools by default.
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "TMPDIR", "GOPATH"];

/// Runner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Used when neither the request nor the tool sets a timeout
    pub default_timeout: Duration,
    /// Time between SIGTERM and SIGKILL
    pub kill_grace: Duration,
    /// Directory for `{outputFile}` paths
    pub output_dir: PathBuf,
    pub env_allowlist: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(300),
            kill_grace: Duration::from_secs(5),
            output_dir: std::env::temp_dir().join("subrecon"),
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RunnerConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_env_allowlist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_allowlist = names.into_iter().map(Into::into).collect();
        self
    }
}

/// How the wait on a child ended.
enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Bytes read from one child stream so far, and the task reading them.
struct StreamReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl StreamReader {
    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        sink.lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .extend_from_slice(&chunk[..n]);
                    }
                    Err(e) => {
                        debug!("Output stream closed with error: {}", e);
                        break;
                    }
                }
            }
        });
        Self { buffer, task }
    }

    fn abort(&self) {
        self.task.abort();
    }

    /// Everything read so far, lossily decoded.
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(|e| e.into_inner()));
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Runs [`ToolSpec`]s as local child processes tracked in a [`ProcessRegistry`].
pub struct LocalProcessRunner {
    registry: Arc<ProcessRegistry>,
    config: RunnerConfig,
}

impl LocalProcessRunner {
    pub fn new(registry: Arc<ProcessRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn allowed_env(&self) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(name, _)| self.config.env_allowlist.iter().any(|allowed| allowed == name))
            .collect()
    }

    fn build_command(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .envs(self.allowed_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        // Linux: request kernel to send SIGTERM to the tool when we die.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        cmd
    }

    /// SIGTERM, wait `kill_grace`, then SIGKILL.
    async fn terminate(&self, child: &mut Child, pid: Option<u32>, tool: &str) {
        if let Some(pid) = pid {
            debug!("Sending {} to {} (pid {})", Signal::Terminate, tool, pid);
            signal_group(pid, Signal::Terminate);
        }

        match tokio::time::timeout(self.config.kill_grace, child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                warn!(
                    "{} ignored {} for {:?}, sending {}",
                    tool,
                    Signal::Terminate,
                    self.config.kill_grace,
                    Signal::Kill
                );
                if let Some(pid) = pid {
                    signal_group(pid, Signal::Kill);
                }
                if let Err(e) = child.kill().await {
                    debug!("Kill of {} failed: {}", tool, e);
                }
            }
        }
    }

    /// Terminate what a tool left running in its process group after exiting.
    ///
    /// Forked helpers would otherwise outlive their registry entry and keep
    /// the output pipes open.
    async fn reap_group(&self, pid: Option<u32>, tool: &str) {
        let Some(pid) = pid else {
            return;
        };
        if !signal_members(pid, Signal::Terminate) {
            return;
        }
        debug!(
            "{} exited with processes left in its group, sent {}",
            tool,
            Signal::Terminate
        );

        let deadline = Instant::now() + self.config.kill_grace;
        while group_alive(pid) && Instant::now() < deadline {
            tokio::time::sleep(GROUP_POLL_INTERVAL).await;
        }
        if group_alive(pid) {
            warn!(
                "Processes left by {} ignored {}, sending {}",
                tool,
                Signal::Terminate,
                Signal::Kill
            );
            signal_members(pid, Signal::Kill);
        }
    }

    /// Collect a stream's output, waiting at most the kill grace period for
    /// it to close. Bytes read before the deadline are kept.
    async fn collect(&self, mut reader: StreamReader) -> String {
        match tokio::time::timeout(self.config.kill_grace, &mut reader.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Output reader failed: {}", e),
            Err(_) => {
                reader.abort();
                debug!("Output stream still open after exit, keeping what was read");
            }
        }
        reader.take()
    }

    /// One spawn-to-terminal attempt with `template`.
    async fn attempt(
        &self,
        spec: &ToolSpec,
        template: &CommandTemplate,
        invocation: &Invocation,
        timeout: Duration,
        is_fallback: bool,
    ) -> Result<RawOutput, ExecutionError> {
        if !self.registry.is_accepting() {
            return Err(ExecutionError::ShuttingDown);
        }

        let execution_id = ExecutionId::generate();
        let output_file = if template.uses_output_file() {
            let file = OutputFile::reserve(
                &self.config.output_dir,
                &spec.name,
                &invocation.domain,
                execution_id.as_str(),
            )
            .map_err(|e| ExecutionError::Spawn {
                command: template.program().to_string(),
                message: format!(
                    "cannot prepare output directory {}: {}",
                    self.config.output_dir.display(),
                    e
                ),
            })?;
            Some(file)
        } else {
            None
        };

        let rendered = template
            .render(&TemplateContext {
                domain: &invocation.domain,
                execution_id: execution_id.as_str(),
                output_file: output_file.as_ref().map(OutputFile::path),
            })
            .map_err(|e| ExecutionError::Validation(e.to_string()))?;

        debug!("Spawning {} ({}): {}", spec.name, execution_id, rendered);
        let started = Instant::now();
        let mut child = self
            .build_command(&rendered.program, &rendered.args)
            .spawn()
            .map_err(|e| ExecutionError::Spawn {
                command: rendered.program.clone(),
                message: e.to_string(),
            })?;
        let pid = child.id();

        let handle = ProcessHandle::new(
            execution_id.clone(),
            pid,
            &spec.name,
            &invocation.domain,
            timeout,
        );
        let cancel = match self.registry.register(handle) {
            Ok(token) => token,
            Err(e) => {
                self.terminate(&mut child, pid, &spec.name).await;
                return Err(e);
            }
        };
        let guard = RegistrationGuard::new(Arc::clone(&self.registry), execution_id);

        let stdout = StreamReader::spawn(child.stdout.take());
        let stderr = StreamReader::spawn(child.stderr.take());

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
            _ = cancel.cancelled() => Outcome::Cancelled,
        };

        match outcome {
            Outcome::TimedOut => {
                warn!("{} timed out after {:?}", spec.name, timeout);
                self.terminate(&mut child, pid, &spec.name).await;
                stdout.abort();
                stderr.abort();
                guard.finish(ProcessState::TimedOut);
                Err(ExecutionError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            Outcome::Cancelled => {
                info!("{} cancelled, terminating", spec.name);
                self.terminate(&mut child, pid, &spec.name).await;
                stdout.abort();
                stderr.abort();
                guard.finish(ProcessState::Killed);
                Err(ExecutionError::Killed(format!(
                    "{} terminated during shutdown or stale sweep",
                    spec.name
                )))
            }
            Outcome::Exited(Err(e)) => {
                stdout.abort();
                stderr.abort();
                guard.finish(ProcessState::Errored);
                Err(ExecutionError::Process {
                    code: None,
                    stdout: String::new(),
                    stderr: format!("failed to wait for process: {}", e),
                })
            }
            Outcome::Exited(Ok(status)) => {
                self.reap_group(pid, &spec.name).await;
                let stdout = self.collect(stdout).await;
                let stderr = self.collect(stderr).await;
                let duration = started.elapsed();

                if !status.success() {
                    guard.finish(ProcessState::Errored);
                    return Err(ExecutionError::Process {
                        code: status.code(),
                        stdout,
                        stderr,
                    });
                }
                guard.finish(ProcessState::Completed);

                let file_content = match &output_file {
                    Some(file) => file.read_non_empty().await,
                    None => None,
                };
                let (content, source) = match file_content {
                    Some(content) => (content, OutputSource::OutputFile),
                    None => (stdout, OutputSource::Stdout),
                };
                debug!(
                    "{} exited cleanly in {:?} ({} bytes from {:?})",
                    spec.name,
                    duration,
                    content.len(),
                    source
                );

                Ok(RawOutput {
                    content,
                    stderr,
                    exit_code: status.code(),
                    source,
                    used_fallback: is_fallback,
                    duration,
                })
            }
        }
    }
}

#[async_trait]
impl ProcessRunnerPort for LocalProcessRunner {
    async fn run(
        &self,
        spec: &ToolSpec,
        invocation: &Invocation,
    ) -> Result<RawOutput, ExecutionError> {
        let timeout = invocation
            .timeout_override
            .or(spec.timeout)
            .unwrap_or(self.config.default_timeout);

        match self
            .attempt(spec, &spec.command, invocation, timeout, false)
            .await
        {
            Err(e) if e.allows_fallback() => match &spec.fallback {
                Some(fallback) => {
                    warn!(
                        "{}: {}; retrying with fallback '{}'",
                        spec.name,
                        e,
                        fallback.command.program()
                    );
                    self.attempt(spec, &fallback.command, invocation, timeout, true)
                        .await
                }
                None => Err(e),
            },
            other => other,
        }
    }

    fn active_processes(&self) -> usize {
        self.registry.active_count()
    }

    async fn kill_all(&self) -> usize {
        self.registry.kill_all()
    }

    async fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.registry.wait_until_empty(timeout).await
    }
}
