//! Projecting a commit's tree onto the working directory.
//!
//! The working tree is flat: only regular files at the root are tracked,
//! restored, or swept. Subdirectories are never entered and never
//! removed. Files that the target commit does not track are deleted
//! unless the protect list keeps them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::commit::Commit;
use crate::error::MiniGitResult;
use crate::object::ObjectStore;
use crate::protect::ProtectList;

/// Materializes commits onto a working directory root.
pub struct Worktree {
    root: PathBuf,
}

impl Worktree {
    /// Create a Worktree over the repository's working directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Make the working directory match `commit`'s tree.
    ///
    /// Writes every tracked blob first, then sweeps root-level files the
    /// tree does not cover. The protect list is reloaded per call so
    /// edits to `.minigitprotect` take effect immediately.
    pub fn restore(&self, store: &ObjectStore, commit: &Commit) -> MiniGitResult<()> {
        for (path, blob_hash) in &commit.tree {
            let content = store.get_blob(blob_hash)?;
            fs::write(self.root.join(path), content)?;
        }

        let protect = ProtectList::load(&self.root);
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if commit.tree.contains_key(&name) || protect.is_protected(&name) {
                continue;
            }
            debug!(file = %name, "removing untracked file");
            fs::remove_file(entry.path())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn test_store(git_dir: &Path) -> ObjectStore {
        fs::create_dir_all(git_dir.join("objects")).unwrap();
        fs::create_dir_all(git_dir.join("commits")).unwrap();
        ObjectStore::new(git_dir)
    }

    fn commit_with(store: &ObjectStore, files: &[(&str, &[u8])]) -> Commit {
        let mut tree = BTreeMap::new();
        for (path, content) in files {
            let hash = hash_bytes(content);
            store.put_blob(&hash, content).unwrap();
            tree.insert(path.to_string(), hash);
        }
        Commit::new(
            "snapshot".to_string(),
            "Thu Jun 13 08:10:34 2024".to_string(),
            Vec::new(),
            tree,
        )
    }

    #[test]
    fn test_restore_writes_tracked_files() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir.path().join(".minigit"));
        let worktree = Worktree::new(dir.path());

        let commit = commit_with(&store, &[("a.txt", b"hello\n"), ("b.txt", b"x\n")]);
        worktree.restore(&store, &commit).unwrap();

        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"hello\n");
        assert_eq!(fs::read(dir.path().join("b.txt")).unwrap(), b"x\n");
    }

    #[test]
    fn test_restore_overwrites_stale_content() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir.path().join(".minigit"));
        let worktree = Worktree::new(dir.path());

        fs::write(dir.path().join("a.txt"), "stale").unwrap();
        let commit = commit_with(&store, &[("a.txt", b"fresh\n")]);
        worktree.restore(&store, &commit).unwrap();

        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"fresh\n");
    }

    #[test]
    fn test_restore_removes_untracked_files() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir.path().join(".minigit"));
        let worktree = Worktree::new(dir.path());

        fs::write(dir.path().join("stray.txt"), "gone").unwrap();
        let commit = commit_with(&store, &[("a.txt", b"kept\n")]);
        worktree.restore(&store, &commit).unwrap();

        assert!(!dir.path().join("stray.txt").exists());
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_restore_keeps_protected_files() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir.path().join(".minigit"));
        let worktree = Worktree::new(dir.path());

        fs::write(dir.path().join(".minigitprotect"), "keep.bin\n*.o\n").unwrap();
        fs::write(dir.path().join("keep.bin"), "artifact").unwrap();
        fs::write(dir.path().join("main.o"), "object").unwrap();
        fs::write(dir.path().join("stray.txt"), "gone").unwrap();

        let commit = commit_with(&store, &[]);
        worktree.restore(&store, &commit).unwrap();

        assert!(dir.path().join("keep.bin").exists());
        assert!(dir.path().join("main.o").exists());
        assert!(dir.path().join(".minigitprotect").exists());
        assert!(!dir.path().join("stray.txt").exists());
    }

    #[test]
    fn test_restore_never_touches_directories() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir.path().join(".minigit"));
        let worktree = Worktree::new(dir.path());

        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir").join("inner.txt"), "safe").unwrap();

        let commit = commit_with(&store, &[]);
        worktree.restore(&store, &commit).unwrap();

        assert!(dir.path().join("subdir").join("inner.txt").exists());
    }

    #[test]
    fn test_restore_is_byte_faithful() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir.path().join(".minigit"));
        let worktree = Worktree::new(dir.path());

        let binary: &[u8] = &[0u8, 159, 146, 150, 10, 0];
        let commit = commit_with(&store, &[("blob.bin", binary)]);
        worktree.restore(&store, &commit).unwrap();

        assert_eq!(fs::read(dir.path().join("blob.bin")).unwrap(), binary);
    }
}
