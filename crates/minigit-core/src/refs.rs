//! Branch refs and the HEAD pointer.
//!
//! A branch is a mutable file `refs/heads/<name>` holding a commit hash.
//! HEAD is either symbolic (`ref: refs/heads/<branch>`) or detached (a
//! bare commit hash). The file is parsed once at read time into [`Head`];
//! nothing downstream probes byte prefixes.
//!
//! All ref writes go through [`atomic_write`], so a crash mid-write never
//! leaves a torn ref: the referring write lands entirely or not at all.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MiniGitError, MiniGitResult};
use crate::fsutil::atomic_write;

/// Prefix marking a symbolic HEAD.
const SYMBOLIC_PREFIX: &str = "ref: refs/heads/";

/// Where HEAD currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD names a branch; the branch names the commit.
    Symbolic(String),
    /// HEAD names a commit directly.
    Detached(String),
    /// The HEAD file is missing or empty (repository being initialized).
    Unborn,
}

/// Branch and HEAD storage under `.minigit/`.
pub struct RefStore {
    git_dir: PathBuf,
    heads_dir: PathBuf,
}

impl RefStore {
    /// Create a RefStore over an existing repository directory.
    pub fn new(git_dir: &Path) -> Self {
        Self {
            git_dir: git_dir.to_path_buf(),
            heads_dir: git_dir.join("refs").join("heads"),
        }
    }

    /// Read a branch's commit hash, or `None` if the branch does not exist.
    pub fn read_branch(&self, name: &str) -> MiniGitResult<Option<String>> {
        let path = self.heads_dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(content.trim().to_string()))
    }

    /// Create or move a branch to point at a commit.
    pub fn write_branch(&self, name: &str, hash: &str) -> MiniGitResult<()> {
        validate_branch_name(name)?;
        atomic_write(&self.heads_dir.join(name), hash.as_bytes())
    }

    /// All branches, name → commit hash, sorted by name.
    pub fn list_branches(&self) -> MiniGitResult<BTreeMap<String, String>> {
        let mut branches = BTreeMap::new();
        for entry in fs::read_dir(&self.heads_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let hash = fs::read_to_string(entry.path())?.trim().to_string();
            branches.insert(name, hash);
        }
        Ok(branches)
    }

    /// Parse the HEAD file.
    pub fn read_head(&self) -> MiniGitResult<Head> {
        let path = self.git_dir.join("HEAD");
        if !path.exists() {
            return Ok(Head::Unborn);
        }
        let content = fs::read_to_string(&path)?;
        let line = content.trim();
        if line.is_empty() {
            return Ok(Head::Unborn);
        }
        if let Some(branch) = line.strip_prefix(SYMBOLIC_PREFIX) {
            Ok(Head::Symbolic(branch.to_string()))
        } else {
            Ok(Head::Detached(line.to_string()))
        }
    }

    /// Point HEAD at a branch.
    pub fn write_head_symbolic(&self, branch: &str) -> MiniGitResult<()> {
        let content = format!("{SYMBOLIC_PREFIX}{branch}\n");
        atomic_write(&self.git_dir.join("HEAD"), content.as_bytes())
    }

    /// Point HEAD at a commit directly.
    pub fn write_head_detached(&self, hash: &str) -> MiniGitResult<()> {
        let content = format!("{hash}\n");
        atomic_write(&self.git_dir.join("HEAD"), content.as_bytes())
    }

    /// Resolve HEAD to the current commit hash, if there is one.
    pub fn current_commit(&self) -> MiniGitResult<Option<String>> {
        match self.read_head()? {
            Head::Symbolic(branch) => self.read_branch(&branch),
            Head::Detached(hash) => Ok(Some(hash)),
            Head::Unborn => Ok(None),
        }
    }
}

/// Reject names the ref layout or the commit format cannot represent.
fn validate_branch_name(name: &str) -> MiniGitResult<()> {
    let bad = name.is_empty()
        || name.contains(['/', '\\', ':'])
        || name.chars().any(|c| c.is_control());
    if bad {
        return Err(MiniGitError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}
