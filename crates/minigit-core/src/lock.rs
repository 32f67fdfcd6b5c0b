//! Repository locking for concurrent safety.
//!
//! Uses advisory file locks (`flock(2)` on Unix) via the `fs2` crate.
//! The OS automatically releases locks when a process crashes, so no
//! PID tracking or stale lock detection is needed. Within one process
//! invocation the in-memory index and refs are authoritative; the lock
//! keeps a second shell from interleaving its own writes.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{MiniGitError, MiniGitResult};

/// Name of the lock file inside `.minigit/`.
const LOCK_FILE: &str = "minigit.lock";

/// An exclusive repository lock.
///
/// Held for the lifetime of the value. When dropped, the lock is
/// released automatically (both the `flock` and the `File` handle).
pub struct RepoLock {
    _file: File,
}

impl RepoLock {
    /// Acquire an exclusive lock on the repository.
    ///
    /// Polls with a short sleep interval until the lock is acquired or
    /// the timeout expires. Returns `MiniGitError::LockTimeout` on failure.
    pub fn acquire(git_dir: &Path, timeout: Duration) -> MiniGitResult<Self> {
        let lock_path = git_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;

        let start = Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(RepoLock { _file: file }),
                Err(_) if start.elapsed() >= timeout => {
                    return Err(MiniGitError::LockTimeout);
                }
                Err(_) => std::thread::sleep(poll_interval),
            }
        }
    }
}
