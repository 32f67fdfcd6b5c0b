//! Content-addressable object store.
//!
//! Blobs live in `.minigit/objects/` and commit records in
//! `.minigit/commits/`, one file per object, filename = hash. Objects are
//! immutable once written: rewriting a hash is permitted only when the
//! bytes match what is already stored, so a hash collision between
//! distinct contents surfaces as [`MiniGitError::CorruptStore`] instead
//! of silently corrupting history.

use std::fs;
use std::path::{Path, PathBuf};

use crate::commit::Commit;
use crate::error::{MiniGitError, MiniGitResult};

/// The object store manages blobs and commit records on disk.
pub struct ObjectStore {
    /// `.minigit/objects/`
    objects_dir: PathBuf,
    /// `.minigit/commits/`
    commits_dir: PathBuf,
}

impl ObjectStore {
    /// Create an ObjectStore over an existing repository directory.
    pub fn new(git_dir: &Path) -> Self {
        Self {
            objects_dir: git_dir.join("objects"),
            commits_dir: git_dir.join("commits"),
        }
    }

    /// Store blob bytes under a caller-computed hash.
    ///
    /// Writing the same bytes twice is a no-op. Writing different bytes
    /// under an existing hash fails: the store would otherwise silently
    /// rewrite history reachable from old commits.
    pub fn put_blob(&self, hash: &str, data: &[u8]) -> MiniGitResult<()> {
        let path = self.objects_dir.join(hash);
        if path.exists() {
            let existing = fs::read(&path)?;
            if existing != data {
                return Err(MiniGitError::CorruptStore(format!(
                    "blob {hash}: hash collision with differing content"
                )));
            }
            return Ok(());
        }
        fs::write(&path, data)?;
        Ok(())
    }

    /// Retrieve blob bytes by hash.
    pub fn get_blob(&self, hash: &str) -> MiniGitResult<Vec<u8>> {
        let path = self.objects_dir.join(hash);
        if !path.exists() {
            return Err(MiniGitError::CorruptStore(format!("blob {hash} missing")));
        }
        Ok(fs::read(&path)?)
    }

    /// Check whether a blob exists.
    pub fn has_blob(&self, hash: &str) -> bool {
        self.objects_dir.join(hash).exists()
    }

    /// Store a commit record at `commits/<hash>`.
    ///
    /// Same overwrite rule as blobs: identical content is a no-op,
    /// conflicting content is an error.
    pub fn put_commit(&self, commit: &Commit) -> MiniGitResult<()> {
        let path = self.commits_dir.join(&commit.hash);
        let body = commit.serialize();
        if path.exists() {
            let existing = fs::read_to_string(&path)?;
            if existing != body {
                return Err(MiniGitError::CorruptStore(format!(
                    "commit {}: hash collision with differing content",
                    commit.hash
                )));
            }
            return Ok(());
        }
        fs::write(&path, body)?;
        Ok(())
    }

    /// Load and parse a commit record by hash.
    pub fn get_commit(&self, hash: &str) -> MiniGitResult<Commit> {
        let path = self.commits_dir.join(hash);
        if !path.exists() {
            return Err(MiniGitError::CorruptStore(format!("commit {hash} missing")));
        }
        let text = fs::read_to_string(&path)?;
        Commit::parse(hash, &text)
    }

    /// Check whether a commit record exists.
    pub fn has_commit(&self, hash: &str) -> bool {
        self.commits_dir.join(hash).exists()
    }
}
