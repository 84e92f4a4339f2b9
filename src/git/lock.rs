//! Advisory lock serializing mutating commands on one repository.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::ToolError;

/// Lock file name inside the git directory.
pub const LOCK_FILE_NAME: &str = "conflict-lens.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Held repository lock; released on drop.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Takes the exclusive lock for a git directory, polling until `timeout`.
    pub fn acquire(git_dir: &Path, timeout: Duration) -> Result<Self> {
        let path = git_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open repository lock {}", path.display()))?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %path.display(), "repository lock acquired");
                    return Ok(Self { file, path });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        warn!(path = %path.display(), "repository lock is busy");
                        return Err(ToolError::Timeout {
                            operation: format!("acquiring repository lock {}", path.display()),
                            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        }
                        .into());
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire repository lock {}", path.display())
                    })
                }
            }
        }
    }

    /// Location of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release repository lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_holder_times_out_until_release() {
        let dir = TempDir::new().unwrap();
        let held = RepoLock::acquire(dir.path(), Duration::from_millis(100)).unwrap();
        assert!(held.path().ends_with(LOCK_FILE_NAME));

        let err = RepoLock::acquire(dir.path(), Duration::from_millis(60)).unwrap_err();
        assert!(matches!(ToolError::classify(&err), ToolError::Timeout { .. }));

        drop(held);
        assert!(RepoLock::acquire(dir.path(), Duration::from_millis(100)).is_ok());
    }
}
