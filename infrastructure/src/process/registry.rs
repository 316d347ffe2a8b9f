//! Process Registry: bookkeeping of in-flight tool processes.
//!
//! Every spawned process is registered under its execution id and removed
//! exactly once when it reaches a terminal [`ProcessState`]. The registry
//! also drives the two ways a process is ended from outside its runner:
//!
//! - [`ProcessRegistry::kill_all`]: cancel every handle and
//!   refuse new registrations from then on
//! - [`ProcessRegistry::sweep_stale`]: force-kill handles that
//!   outlived their timeout plus a margin
//!
//! Cancellation reaches the runner through a per-handle
//! [`CancellationToken`]; the runner then terminates the process itself.

use super::signal::{Signal, signal_group};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use subrecon_domain::{ExecutionError, ExecutionId, ProcessState};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One tracked process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pub execution_id: ExecutionId,
    pub pid: Option<u32>,
    pub tool: String,
    pub domain: String,
    pub started_at: Instant,
    /// Budget the runner enforces; the sweep uses it to detect stale handles
    pub timeout: Duration,
    pub state: ProcessState,
    cancel: CancellationToken,
}

impl ProcessHandle {
    pub fn new(
        execution_id: ExecutionId,
        pid: Option<u32>,
        tool: impl Into<String>,
        domain: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            execution_id,
            pid,
            tool: tool.into(),
            domain: domain.into(),
            started_at: Instant::now(),
            timeout,
            state: ProcessState::Running,
            cancel: CancellationToken::new(),
        }
    }

    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Snapshot returned by [`ProcessRegistry::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub active_processes: usize,
    pub max_concurrent: usize,
}

/// Shared map of running tool processes.
#[derive(Debug)]
pub struct ProcessRegistry {
    handles: Mutex<HashMap<ExecutionId, ProcessHandle>>,
    accepting: AtomicBool,
    drained: Notify,
    max_concurrent: usize,
}

impl ProcessRegistry {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            accepting: AtomicBool::new(true),
            drained: Notify::new(),
            max_concurrent,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ExecutionId, ProcessHandle>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Track a freshly spawned process.
    ///
    /// Returns the token that is cancelled when the process must be
    /// terminated. Fails with [`ExecutionError::ShuttingDown`] after
    /// [`kill_all`](Self::kill_all).
    pub fn register(&self, handle: ProcessHandle) -> Result<CancellationToken, ExecutionError> {
        let mut handles = self.lock();
        if !self.is_accepting() {
            return Err(ExecutionError::ShuttingDown);
        }

        let token = handle.cancel.clone();
        debug!(
            "Registered {} (pid {:?}) for {} as {}",
            handle.tool, handle.pid, handle.domain, handle.execution_id
        );
        handles.insert(handle.execution_id.clone(), handle);
        Ok(token)
    }

    /// Remove a handle on its terminal transition.
    ///
    /// Returns `None` if it was already removed (e.g. by a sweep), so no
    /// handle is ever counted twice.
    pub fn complete(&self, execution_id: &ExecutionId, state: ProcessState) -> Option<ProcessHandle> {
        let (removed, now_empty) = {
            let mut handles = self.lock();
            let removed = handles.remove(execution_id);
            (removed, handles.is_empty())
        };

        if now_empty {
            self.drained.notify_waiters();
        }

        removed.map(|mut handle| {
            handle.state = state;
            debug!(
                "{} ({}) finished as {} after {:?}",
                handle.tool,
                handle.execution_id,
                state,
                handle.age()
            );
            handle
        })
    }

    /// Terminate every tracked process and stop accepting registrations.
    ///
    /// Idempotent. Returns how many processes were told to stop.
    pub fn kill_all(&self) -> usize {
        let handles = self.lock();
        self.accepting.store(false, Ordering::SeqCst);

        for handle in handles.values() {
            info!(
                "Terminating {} (pid {:?}, {})",
                handle.tool, handle.pid, handle.execution_id
            );
            handle.cancel.cancel();
        }
        handles.len()
    }

    /// Force-terminate handles older than their timeout plus `margin`.
    ///
    /// Swept handles are removed here; their runners find them gone.
    pub fn sweep_stale(&self, margin: Duration) -> usize {
        let stale: Vec<ProcessHandle> = {
            let mut handles = self.lock();
            let ids: Vec<ExecutionId> = handles
                .values()
                .filter(|h| h.age() > h.timeout + margin)
                .map(|h| h.execution_id.clone())
                .collect();
            ids.iter().filter_map(|id| handles.remove(id)).collect()
        };

        for handle in &stale {
            warn!(
                "Sweeping stale process {} (pid {:?}, {}) after {:?}",
                handle.tool,
                handle.pid,
                handle.execution_id,
                handle.age()
            );
            handle.cancel.cancel();
            if let Some(pid) = handle.pid {
                signal_group(pid, Signal::Kill);
            }
        }

        if !stale.is_empty() && self.active_count() == 0 {
            self.drained.notify_waiters();
        }
        stale.len()
    }

    /// Run [`sweep_stale`](Self::sweep_stale) every `interval` until the
    /// registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration, margin: Duration) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    debug!("Process registry dropped, stopping sweeper");
                    break;
                };
                let swept = registry.sweep_stale(margin);
                if swept > 0 {
                    info!("Stale sweep terminated {} process(es)", swept);
                }
            }
        })
    }

    /// Wait until no handle is tracked, at most `timeout`.
    pub async fn wait_until_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let drained = self.drained.notified();
            if self.active_count() == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, drained).await.is_err() {
                return self.active_count() == 0;
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Tracked handles, oldest first.
    pub fn snapshot(&self) -> Vec<ProcessHandle> {
        let mut handles: Vec<ProcessHandle> = self.lock().values().cloned().collect();
        handles.sort_by_key(|h| h.started_at);
        handles
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_processes: self.active_count(),
            max_concurrent: self.max_concurrent,
        }
    }
}

/// Deregisters its handle when dropped, so an aborted runner cannot leak one.
pub struct RegistrationGuard {
    registry: Arc<ProcessRegistry>,
    execution_id: Option<ExecutionId>,
}

impl RegistrationGuard {
    pub fn new(registry: Arc<ProcessRegistry>, execution_id: ExecutionId) -> Self {
        Self {
            registry,
            execution_id: Some(execution_id),
        }
    }

    /// Record the terminal state and deregister.
    pub fn finish(mut self, state: ProcessState) -> Option<ProcessHandle> {
        self.execution_id
            .take()
            .and_then(|id| self.registry.complete(&id, state))
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if let Some(id) = self.execution_id.take() {
            self.registry.complete(&id, ProcessState::Errored);
        }
    }
}
