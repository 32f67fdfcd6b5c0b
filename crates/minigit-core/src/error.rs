//! Error types for minigit operations.

use std::fmt;
use std::io;

/// All possible minigit errors.
#[derive(Debug)]
pub enum MiniGitError {
    /// The current directory is not a minigit repository.
    NotARepo,
    /// A minigit repository already exists here.
    AlreadyInitialized,
    /// An I/O error occurred.
    Io(io::Error),
    /// `add` was given a path that does not exist on disk.
    PathMissing(String),
    /// A path contains characters the on-disk format cannot represent.
    InvalidPath(String),
    /// A commit message contains a newline, which the record format
    /// cannot represent.
    InvalidMessage,
    /// `commit` was called with an empty staging area.
    NothingStaged,
    /// A checkout or merge target resolved to neither a branch nor a commit.
    UnknownRef(String),
    /// `branch` was given a name that already exists.
    BranchExists(String),
    /// A branch name contains a path separator or a format control character.
    InvalidBranchName(String),
    /// The operation requires a branch, but HEAD is detached.
    DetachedHead,
    /// An object the DAG requires is missing, or a write found conflicting
    /// bytes already stored under the same hash.
    CorruptStore(String),
    /// Could not acquire the repository lock within the timeout.
    LockTimeout,
}

impl fmt::Display for MiniGitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiniGitError::NotARepo => write!(f, "not a minigit repository (missing .minigit/)"),
            MiniGitError::AlreadyInitialized => write!(f, ".minigit/ already exists"),
            MiniGitError::Io(e) => write!(f, "I/O error: {e}"),
            MiniGitError::PathMissing(path) => write!(f, "file not found: {path}"),
            MiniGitError::InvalidPath(path) => {
                write!(f, "unsupported path (contains ':' or newline): {path}")
            }
            MiniGitError::InvalidMessage => {
                write!(f, "commit messages must be a single line")
            }
            MiniGitError::NothingStaged => write!(f, "no changes staged for commit"),
            MiniGitError::UnknownRef(name) => write!(f, "unknown branch or commit: {name}"),
            MiniGitError::BranchExists(name) => write!(f, "branch already exists: {name}"),
            MiniGitError::InvalidBranchName(name) => write!(f, "invalid branch name: {name}"),
            MiniGitError::DetachedHead => {
                write!(f, "HEAD is detached; check out a branch first")
            }
            MiniGitError::CorruptStore(msg) => write!(f, "corrupt object store: {msg}"),
            MiniGitError::LockTimeout => {
                write!(f, "could not acquire repository lock within timeout")
            }
        }
    }
}

impl std::error::Error for MiniGitError {}

impl From<io::Error> for MiniGitError {
    fn from(e: io::Error) -> Self {
        MiniGitError::Io(e)
    }
}

/// Convenience alias for Results in minigit.
pub type MiniGitResult<T> = Result<T, MiniGitError>;
