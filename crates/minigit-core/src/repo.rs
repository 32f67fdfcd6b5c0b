//! Repository — the main entry point for minigit operations.
//!
//! A Repository ties together the object store, refs, index, worktree,
//! and merge engine into a unified interface. It owns the ordering
//! guarantees: objects land on disk before the refs that name them, ref
//! and index writes are atomic, and every mutating operation holds the
//! repository lock for its duration.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use crate::commit::Commit;
use crate::dag;
use crate::error::{MiniGitError, MiniGitResult};
use crate::fsutil::atomic_write;
use crate::hash::hash_bytes;
use crate::index::Index;
use crate::lock::RepoLock;
use crate::merge::{self, MergeOutcome, Resolution};
use crate::object::ObjectStore;
use crate::refs::{Head, RefStore};
use crate::worktree::Worktree;

/// The repository directory name.
const GIT_DIR: &str = ".minigit";

/// The branch created by `init`.
pub const DEFAULT_BRANCH: &str = "main";

/// Message on the commit `init` creates.
const ROOT_COMMIT_MESSAGE: &str = "Initial commit";

/// Flag file naming the branch a three-way merge came from. Present only
/// between a conflicted/staged merge and the commit that concludes it.
const MERGE_STATE_FILE: &str = "MERGE_STATE";

/// ctime-style local timestamp, e.g. `Thu Jun 13 08:10:34 2024`.
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// The result of staging a batch of paths.
#[derive(Debug, Clone, Serialize)]
pub struct AddReport {
    /// Paths staged successfully.
    pub staged: Vec<String>,
    /// Paths that could not be staged, with the reason. A bad path does
    /// not abort the rest of the batch.
    pub skipped: Vec<SkippedPath>,
}

/// A path that `add` could not stage.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPath {
    pub path: String,
    pub reason: String,
}

/// One commit in `log` output, newest first, first-parent order.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub hash: String,
    pub timestamp: String,
    pub message: String,
    pub parents: Vec<String>,
}

/// How a staged entry relates to the current commit's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Not present in the current tree.
    Added,
    /// Present with a different blob.
    Modified,
    /// Present with the same blob.
    Unchanged,
    /// Staged removal. The index cannot currently express one; the code
    /// exists for the status format.
    Deleted,
}

impl StageStatus {
    /// Single-character status code used in human output.
    pub fn code(self) -> char {
        match self {
            StageStatus::Added => 'A',
            StageStatus::Modified => 'M',
            StageStatus::Unchanged => ' ',
            StageStatus::Deleted => 'D',
        }
    }
}

/// A staged path and its status code.
#[derive(Debug, Clone, Serialize)]
pub struct StagedEntry {
    pub path: String,
    pub status: StageStatus,
}

/// One branch in `status` output.
#[derive(Debug, Clone, Serialize)]
pub struct BranchInfo {
    pub name: String,
    pub hash: String,
    pub current: bool,
}

/// Full `status` output.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Current branch name; `None` when HEAD is detached.
    pub branch: Option<String>,
    /// The commit HEAD resolves to.
    pub head_commit: Option<String>,
    pub staged: Vec<StagedEntry>,
    pub branches: Vec<BranchInfo>,
    /// Target branch of an unconcluded merge, if one is in progress.
    pub merge_in_progress: Option<String>,
}

/// What `checkout` did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum CheckoutOutcome {
    /// Switched to a branch; HEAD is symbolic.
    Branch { name: String, hash: String },
    /// Checked out a commit directly; HEAD is detached.
    Detached { hash: String },
}

/// A minigit repository.
pub struct Repository {
    /// Root of the working directory (where `.minigit/` lives).
    root: PathBuf,
    /// Path to the `.minigit/` directory.
    git_dir: PathBuf,
    /// Content-addressable storage for blobs and commits.
    objects: ObjectStore,
    /// Branch refs and HEAD.
    refs: RefStore,
    /// Working-directory materializer.
    worktree: Worktree,
}

impl Repository {
    /// Default lock timeout for mutating operations.
    const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

    /// Initialize a new minigit repository in the given directory.
    ///
    /// Creates the `.minigit/` layout, a root commit with an empty tree,
    /// the default branch pointing at it, and a symbolic HEAD.
    pub fn init(root: &Path) -> MiniGitResult<Self> {
        let git_dir = root.join(GIT_DIR);

        if git_dir.exists() {
            return Err(MiniGitError::AlreadyInitialized);
        }

        fs::create_dir_all(git_dir.join("objects"))?;
        fs::create_dir_all(git_dir.join("commits"))?;
        fs::create_dir_all(git_dir.join("refs").join("heads"))?;
        fs::write(git_dir.join("index"), "")?;

        let repo = Self::open(root)?;

        let root_commit = Commit::new(
            ROOT_COMMIT_MESSAGE.to_string(),
            timestamp(),
            Vec::new(),
            BTreeMap::new(),
        );
        repo.objects.put_commit(&root_commit)?;
        repo.refs.write_branch(DEFAULT_BRANCH, &root_commit.hash)?;
        repo.refs.write_head_symbolic(DEFAULT_BRANCH)?;

        info!(branch = DEFAULT_BRANCH, commit = %root_commit.hash, "initialized repository");
        Ok(repo)
    }

    /// Open an existing minigit repository.
    pub fn open(root: &Path) -> MiniGitResult<Self> {
        let git_dir = root.join(GIT_DIR);

        if !git_dir.exists() {
            return Err(MiniGitError::NotARepo);
        }

        Ok(Self {
            root: root.to_path_buf(),
            objects: ObjectStore::new(&git_dir),
            refs: RefStore::new(&git_dir),
            worktree: Worktree::new(root),
            git_dir,
        })
    }

    /// Stage each path: hash the file, store its blob, record it in the
    /// index. A missing or unsupportable path is reported and skipped;
    /// the rest of the batch proceeds.
    pub fn add(&self, paths: &[String]) -> MiniGitResult<AddReport> {
        let _lock = self.lock()?;
        let mut index = self.load_index()?;

        let mut staged = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            let full = self.root.join(path);
            if !full.is_file() {
                skipped.push(SkippedPath {
                    path: path.clone(),
                    reason: MiniGitError::PathMissing(path.clone()).to_string(),
                });
                continue;
            }
            let content = fs::read(&full)?;
            let blob_hash = hash_bytes(&content);
            if let Err(e) = index.stage(path, blob_hash.clone()) {
                skipped.push(SkippedPath {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
            // Blob before index: a crash in between leaves an orphan
            // blob, never an index entry naming a missing object.
            self.objects.put_blob(&blob_hash, &content)?;
            debug!(path = %path, blob = %blob_hash, "staged");
            staged.push(path.clone());
        }

        self.persist_index(&index)?;
        Ok(AddReport { staged, skipped })
    }

    /// Record the staged changes as a new commit on the current branch.
    ///
    /// The new tree is the current commit's tree overlaid with the index.
    /// If a merge is in progress, the merge target becomes a second
    /// parent and the merge state is cleared. Commits on a detached HEAD
    /// are rejected: the result would be unreachable from any ref.
    pub fn commit(&self, message: &str) -> MiniGitResult<String> {
        if message.contains('\n') {
            return Err(MiniGitError::InvalidMessage);
        }

        let _lock = self.lock()?;
        let mut index = self.load_index()?;
        if index.is_empty() {
            return Err(MiniGitError::NothingStaged);
        }

        let branch = match self.refs.read_head()? {
            Head::Symbolic(branch) => branch,
            Head::Detached(_) => return Err(MiniGitError::DetachedHead),
            Head::Unborn => {
                return Err(MiniGitError::CorruptStore("HEAD is unborn".to_string()))
            }
        };

        let mut parents = Vec::new();
        let mut tree = BTreeMap::new();
        if let Some(current_hash) = self.refs.read_branch(&branch)? {
            let current = self.objects.get_commit(&current_hash)?;
            tree = current.tree;
            parents.push(current_hash);
        }

        if let Some(target_branch) = self.read_merge_state()? {
            let target_hash = self
                .refs
                .read_branch(&target_branch)?
                .ok_or(MiniGitError::UnknownRef(target_branch))?;
            if !parents.contains(&target_hash) {
                parents.push(target_hash);
            }
        }

        for (path, blob_hash) in index.snapshot() {
            tree.insert(path.clone(), blob_hash.clone());
        }

        let commit = Commit::new(message.to_string(), timestamp(), parents, tree);

        // Commit object before the ref that names it: a crash in between
        // leaves a dangling commit, never a ref to a missing object.
        self.objects.put_commit(&commit)?;
        self.refs.write_branch(&branch, &commit.hash)?;

        index.clear();
        self.persist_index(&index)?;
        self.clear_merge_state()?;

        debug!(commit = %commit.hash, branch = %branch, "recorded commit");
        Ok(commit.hash)
    }

    /// The first-parent chain from HEAD, newest first.
    pub fn log(&self) -> MiniGitResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut current = self.refs.current_commit()?;

        while let Some(hash) = current {
            let commit = self.objects.get_commit(&hash)?;
            current = commit.first_parent().map(str::to_string);
            entries.push(LogEntry {
                hash: commit.hash,
                timestamp: commit.timestamp,
                message: commit.message,
                parents: commit.parents,
            });
        }

        Ok(entries)
    }

    /// Current branch (or detached commit), staged entries with status
    /// codes, and the branch list.
    pub fn status(&self) -> MiniGitResult<StatusReport> {
        let (branch, head_commit) = match self.refs.read_head()? {
            Head::Symbolic(name) => {
                let hash = self.refs.read_branch(&name)?;
                (Some(name), hash)
            }
            Head::Detached(hash) => (None, Some(hash)),
            Head::Unborn => (None, None),
        };

        let tree = match &head_commit {
            Some(hash) => self.objects.get_commit(hash)?.tree,
            None => BTreeMap::new(),
        };

        let index = self.load_index()?;
        let staged = index
            .snapshot()
            .iter()
            .map(|(path, blob_hash)| {
                let status = match tree.get(path) {
                    None => StageStatus::Added,
                    Some(existing) if existing != blob_hash => StageStatus::Modified,
                    Some(_) => StageStatus::Unchanged,
                };
                StagedEntry {
                    path: path.clone(),
                    status,
                }
            })
            .collect();

        let branches = self
            .refs
            .list_branches()?
            .into_iter()
            .map(|(name, hash)| BranchInfo {
                current: branch.as_deref() == Some(name.as_str()),
                name,
                hash,
            })
            .collect();

        Ok(StatusReport {
            branch,
            head_commit,
            staged,
            branches,
            merge_in_progress: self.read_merge_state()?,
        })
    }

    /// Create a branch at the current commit. Returns the commit hash the
    /// branch points at.
    pub fn branch(&self, name: &str) -> MiniGitResult<String> {
        let _lock = self.lock()?;
        if self.refs.read_branch(name)?.is_some() {
            return Err(MiniGitError::BranchExists(name.to_string()));
        }
        let hash = self.refs.current_commit()?.ok_or_else(|| {
            MiniGitError::CorruptStore("HEAD does not resolve to a commit".to_string())
        })?;
        self.refs.write_branch(name, &hash)?;
        Ok(hash)
    }

    /// Switch the working tree to a branch or a commit hash. Branches
    /// take precedence when a name collides with a commit hash.
    pub fn checkout(&self, target: &str) -> MiniGitResult<CheckoutOutcome> {
        let _lock = self.lock()?;

        if let Some(hash) = self.refs.read_branch(target)? {
            let commit = self.objects.get_commit(&hash)?;
            self.refs.write_head_symbolic(target)?;
            self.worktree.restore(&self.objects, &commit)?;
            debug!(branch = %target, commit = %hash, "checked out branch");
            return Ok(CheckoutOutcome::Branch {
                name: target.to_string(),
                hash,
            });
        }

        if self.objects.has_commit(target) {
            let commit = self.objects.get_commit(target)?;
            self.refs.write_head_detached(target)?;
            self.worktree.restore(&self.objects, &commit)?;
            debug!(commit = %target, "checked out detached commit");
            return Ok(CheckoutOutcome::Detached {
                hash: target.to_string(),
            });
        }

        Err(MiniGitError::UnknownRef(target.to_string()))
    }

    /// Merge a branch into the current commit.
    ///
    /// Up-to-date and fast-forward cases never create a merge commit. A
    /// three-way reconciliation stages clean takes, writes conflict
    /// markers for divergent paths, and records the merge target so the
    /// concluding `commit` carries both parents. Conflicts are a normal
    /// outcome, not an error.
    pub fn merge(&self, branch: &str) -> MiniGitResult<MergeOutcome> {
        let _lock = self.lock()?;

        let target_hash = self
            .refs
            .read_branch(branch)?
            .ok_or_else(|| MiniGitError::UnknownRef(branch.to_string()))?;

        let (current_hash, current_branch) = match self.refs.read_head()? {
            Head::Symbolic(name) => {
                let hash = self.refs.read_branch(&name)?.ok_or_else(|| {
                    MiniGitError::CorruptStore(format!("HEAD names missing branch {name}"))
                })?;
                (hash, Some(name))
            }
            Head::Detached(hash) => (hash, None),
            Head::Unborn => {
                return Err(MiniGitError::CorruptStore("HEAD is unborn".to_string()))
            }
        };

        let base = dag::lca(&self.objects, &current_hash, &target_hash)?.ok_or_else(|| {
            MiniGitError::CorruptStore("merge targets share no common ancestor".to_string())
        })?;

        if base == target_hash {
            return Ok(MergeOutcome::UpToDate);
        }

        if base == current_hash {
            match &current_branch {
                Some(name) => self.refs.write_branch(name, &target_hash)?,
                None => self.refs.write_head_detached(&target_hash)?,
            }
            let commit = self.objects.get_commit(&target_hash)?;
            self.worktree.restore(&self.objects, &commit)?;
            info!(target = %target_hash, "fast-forward merge");
            return Ok(MergeOutcome::FastForward {
                target: target_hash,
            });
        }

        // A three-way result is concluded by a commit, which needs a
        // branch to land on.
        if current_branch.is_none() {
            return Err(MiniGitError::DetachedHead);
        }

        let base_commit = self.objects.get_commit(&base)?;
        let current_commit = self.objects.get_commit(&current_hash)?;
        let target_commit = self.objects.get_commit(&target_hash)?;

        let mut index = self.load_index()?;
        let mut staged = Vec::new();
        let mut conflicts = Vec::new();

        for (path, resolution) in merge::resolve_trees(
            &base_commit.tree,
            &current_commit.tree,
            &target_commit.tree,
        ) {
            match resolution {
                Resolution::Stage(blob_hash) => {
                    index.stage(&path, blob_hash)?;
                    staged.push(path);
                }
                Resolution::Keep => {}
                Resolution::Conflict => {
                    let ours = self.blob_at(&current_commit, &path)?;
                    let theirs = self.blob_at(&target_commit, &path)?;
                    let body = merge::conflict_markers(&ours, &theirs);
                    fs::write(self.root.join(&path), body)?;
                    conflicts.push(path);
                }
            }
        }

        self.persist_index(&index)?;
        self.write_merge_state(branch)?;

        info!(
            target = %branch,
            staged = staged.len(),
            conflicts = conflicts.len(),
            "three-way merge"
        );
        Ok(MergeOutcome::Merged { staged, conflicts })
    }

    // --- Internal helpers ---

    fn lock(&self) -> MiniGitResult<RepoLock> {
        RepoLock::acquire(&self.git_dir, Self::LOCK_TIMEOUT)
    }

    fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    fn load_index(&self) -> MiniGitResult<Index> {
        Index::load(&self.index_path())
    }

    fn persist_index(&self, index: &Index) -> MiniGitResult<()> {
        index.persist(&self.index_path())
    }

    /// A path's blob bytes in a commit's tree, or empty if untracked.
    fn blob_at(&self, commit: &Commit, path: &str) -> MiniGitResult<Vec<u8>> {
        match commit.tree.get(path) {
            Some(hash) => self.objects.get_blob(hash),
            None => Ok(Vec::new()),
        }
    }

    fn merge_state_path(&self) -> PathBuf {
        self.git_dir.join(MERGE_STATE_FILE)
    }

    fn read_merge_state(&self) -> MiniGitResult<Option<String>> {
        let path = self.merge_state_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let name = content.trim();
        if name.is_empty() {
            return Ok(None);
        }
        Ok(Some(name.to_string()))
    }

    fn write_merge_state(&self, branch: &str) -> MiniGitResult<()> {
        atomic_write(&self.merge_state_path(), format!("{branch}\n").as_bytes())
    }

    fn clear_merge_state(&self) -> MiniGitResult<()> {
        match fs::remove_file(self.merge_state_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Local wall-clock time as a single line.
fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
