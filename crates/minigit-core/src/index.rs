//! The staging area.
//!
//! The index maps paths to blob hashes between `add` and `commit`. It is
//! persisted as `.minigit/index`, one `path:hex` line per entry, and
//! rewritten whole on every change. Because the format is line-oriented,
//! paths containing `:` or newlines are rejected at staging time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{MiniGitError, MiniGitResult};
use crate::fsutil::atomic_write;

/// The staged path → blob hash mapping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<String, String>,
}

impl Index {
    /// Load the index from disk, or return an empty index if the file is
    /// absent.
    pub fn load(path: &Path) -> MiniGitResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let (file, hash) = line.split_once(':').ok_or_else(|| {
                MiniGitError::CorruptStore(format!("malformed index line: {line}"))
            })?;
            entries.insert(file.to_string(), hash.to_string());
        }
        Ok(Self { entries })
    }

    /// Persist the index, rewriting the file whole.
    pub fn persist(&self, path: &Path) -> MiniGitResult<()> {
        let mut out = String::new();
        for (file, hash) in &self.entries {
            out.push_str(file);
            out.push(':');
            out.push_str(hash);
            out.push('\n');
        }
        atomic_write(path, out.as_bytes())
    }

    /// Record a path as staged at the given blob hash.
    pub fn stage(&mut self, path: &str, blob_hash: String) -> MiniGitResult<()> {
        if path.is_empty() || path.contains(':') || path.contains('\n') {
            return Err(MiniGitError::InvalidPath(path.to_string()));
        }
        self.entries.insert(path.to_string(), blob_hash);
        Ok(())
    }

    /// Remove a path from the staging area. Returns whether it was staged.
    pub fn unstage(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    /// The staged entries, sorted by path.
    pub fn snapshot(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Drop all staged entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the staged hash for a path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_index() {
        let idx = Index::default();
        assert!(idx.is_empty());
        assert_eq!(idx.get("a.txt"), None);
    }

    #[test]
    fn test_stage_and_get() {
        let mut idx = Index::default();
        idx.stage("a.txt", "1111111111111111".to_string()).unwrap();
        assert_eq!(idx.get("a.txt"), Some("1111111111111111"));
        assert!(!idx.is_empty());
    }

    #[test]
    fn test_stage_rejects_format_breaking_paths() {
        let mut idx = Index::default();
        for path in ["", "a:b.txt", "a\nb.txt"] {
            let err = idx.stage(path, "1111111111111111".to_string());
            assert!(
                matches!(err, Err(MiniGitError::InvalidPath(_))),
                "path {path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unstage() {
        let mut idx = Index::default();
        idx.stage("a.txt", "1111111111111111".to_string()).unwrap();
        assert!(idx.unstage("a.txt"));
        assert!(!idx.unstage("a.txt"));
        assert!(idx.is_empty());
    }

    #[test]
    fn test_persist_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");

        let mut idx = Index::default();
        idx.stage("b.txt", "00000000000000bb".to_string()).unwrap();
        idx.stage("a.txt", "00000000000000aa".to_string()).unwrap();
        idx.persist(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a.txt:00000000000000aa\nb.txt:00000000000000bb\n"
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let idx = Index::load(&dir.path().join("index")).unwrap();
        assert!(idx.is_empty());
    }

    #[test]
    fn test_load_malformed_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        fs::write(&path, "no-colon\n").unwrap();
        let err = Index::load(&path);
        assert!(matches!(err, Err(MiniGitError::CorruptStore(_))));
    }

    #[test]
    fn test_clear_then_persist_empties_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");

        let mut idx = Index::default();
        idx.stage("a.txt", "00000000000000aa".to_string()).unwrap();
        idx.persist(&path).unwrap();
        idx.clear();
        idx.persist(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(Index::load(&path).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_persist_load_roundtrip(
            entries in proptest::collection::btree_map(
                "[a-zA-Z0-9._-]{1,24}",
                "[0-9a-f]{16}",
                0..16,
            )
        ) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("index");

            let mut idx = Index::default();
            for (file, hash) in &entries {
                idx.stage(file, hash.clone()).unwrap();
            }
            idx.persist(&path).unwrap();

            let loaded = Index::load(&path).unwrap();
            prop_assert_eq!(loaded, idx);
        }
    }
}
