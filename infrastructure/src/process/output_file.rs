//! Temporary output files for tools that write results to disk.
//!
//! The path is reserved, not created: the tool writes it. The file is removed
//! when the [`OutputFile`] is dropped, on every exit path of the runner.

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Replace anything outside `[A-Za-z0-9._-]` so names stay one path component.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Guard over a `{tool}_{domain}_{timestamp}_{executionId}` path.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    /// Reserve a path inside `dir`, creating the directory if needed.
    pub fn reserve(dir: &Path, tool: &str, domain: &str, execution_id: &str) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let name = format!(
            "{}_{}_{}_{}",
            sanitize(tool),
            sanitize(domain),
            Utc::now().timestamp_millis(),
            sanitize(execution_id)
        );
        Ok(Self {
            path: dir.join(name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents, if the tool wrote anything besides whitespace.
    pub async fn read_non_empty(&self) -> Option<String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                (!content.trim().is_empty()).then_some(content)
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!("Cannot read output file {}: {}", self.path.display(), e);
                }
                None
            }
        }
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed output file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!("Cannot remove output file {}: {}", self.path.display(), e),
        }
    }
}
