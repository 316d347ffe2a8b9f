//! Signal delivery to spawned tool processes.
//!
//! Tools are started as leaders of their own process group, so signals go to
//! the whole group and reach anything the tool forked.

/// Signals the runner and registry send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Polite termination request (SIGTERM)
    Terminate,
    /// Forced termination (SIGKILL)
    Kill,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Terminate => "SIGTERM",
            Signal::Kill => "SIGKILL",
        }
    }

    #[cfg(unix)]
    fn raw(&self) -> libc::c_int {
        match self {
            Signal::Terminate => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Send `signal` to the process group led by `pid`.
///
/// Returns whether the signal was delivered; `false` usually means the
/// group already exited.
#[cfg(unix)]
pub fn signal_group(pid: u32, signal: Signal) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: kill(2) has no memory-safety preconditions; a negative pid
    // addresses the process group.
    let delivered = unsafe { libc::kill(-pid, signal.raw()) } == 0;
    if !delivered {
        // Not a group leader (e.g. setpgid failed): fall back to the process.
        // SAFETY: as above.
        return unsafe { libc::kill(pid, signal.raw()) } == 0;
    }
    true
}

#[cfg(not(unix))]
pub fn signal_group(_pid: u32, _signal: Signal) -> bool {
    false
}

#[cfg(unix)]
fn group_id(pgid: u32) -> Option<libc::pid_t> {
    libc::pid_t::try_from(pgid).ok().filter(|pgid| *pgid > 0)
}

/// Send `signal` to whatever is left in the group after its leader exited.
///
/// Never falls back to the single pid: once the leader is reaped that pid
/// may belong to an unrelated process.
#[cfg(unix)]
pub fn signal_members(pgid: u32, signal: Signal) -> bool {
    let Some(pgid) = group_id(pgid) else {
        return false;
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    unsafe { libc::kill(-pgid, signal.raw()) == 0 }
}

#[cfg(not(unix))]
pub fn signal_members(_pgid: u32, _signal: Signal) -> bool {
    false
}

/// Whether any process is still in the group.
#[cfg(unix)]
pub fn group_alive(pgid: u32) -> bool {
    let Some(pgid) = group_id(pgid) else {
        return false;
    };
    // SAFETY: signal 0 only checks for existence.
    unsafe { libc::kill(-pgid, 0) == 0 }
}

#[cfg(not(unix))]
pub fn group_alive(_pgid: u32) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(Signal::Terminate.to_string(), "SIGTERM");
        assert_eq!(Signal::Kill.as_str(), "SIGKILL");
    }

    #[test]
    fn test_invalid_pid_is_not_signalled() {
        assert!(!signal_group(0, Signal::Terminate));
        assert!(!signal_group(u32::MAX, Signal::Kill));
    }

    #[tokio::test]
    async fn test_members_outlive_leader_until_signalled() {
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", "sleep 30 &"])
            .process_group(0)
            .spawn()
            .unwrap();
        let pgid = child.id().unwrap();
        child.wait().await.unwrap();

        assert!(group_alive(pgid));
        assert!(signal_members(pgid, Signal::Kill));
    }

    #[test]
    fn test_members_of_invalid_group() {
        assert!(!group_alive(0));
        assert!(!signal_members(u32::MAX, Signal::Terminate));
    }

    #[tokio::test]
    async fn test_terminate_group() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .process_group(0)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();

        assert!(signal_group(pid, Signal::Terminate));
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}
