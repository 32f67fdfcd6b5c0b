//! Commits — immutable snapshot records.
//!
//! A commit records a message, a creation timestamp, zero or more parent
//! hashes, and a flat tree mapping paths to blob hashes. Its identity is
//! the hash of its serialized form, so the serialization must be
//! deterministic: parents keep insertion order and tree entries iterate
//! in path order (`BTreeMap`).
//!
//! On-disk format (LF line endings):
//!
//! ```text
//! <message line>
//! <timestamp line>
//! <parent-hex>...
//! ---
//! <path>:<hex>...
//! ```
//!
//! Messages and timestamps are single-line; paths must not contain `:`
//! or newlines. The format is line-oriented by construction, so those
//! constraints are enforced where data enters the system (staging, the
//! commit engine), not here.

use std::collections::BTreeMap;

use crate::error::{MiniGitError, MiniGitResult};
use crate::hash::{hash_str, looks_like_hash};

/// Separator line between the parent list and the tree entries.
const TREE_SEPARATOR: &str = "---";

/// An immutable snapshot record in the history DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Content hash of the serialized record.
    pub hash: String,
    /// Single-line user message.
    pub message: String,
    /// Single-line local creation time.
    pub timestamp: String,
    /// Parent commit hashes: none for the root, one for a normal commit,
    /// two for a merge.
    pub parents: Vec<String>,
    /// Flat tree: path → blob hash, ordered by path.
    pub tree: BTreeMap<String, String>,
}

impl Commit {
    /// Build a commit and derive its hash from the serialized form.
    pub fn new(
        message: String,
        timestamp: String,
        parents: Vec<String>,
        tree: BTreeMap<String, String>,
    ) -> Self {
        let mut commit = Commit {
            hash: String::new(),
            message,
            timestamp,
            parents,
            tree,
        };
        commit.hash = hash_str(&commit.serialize());
        commit
    }

    /// Render the on-disk representation. The hash is derived from this
    /// text, so it never appears inside it.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.message);
        out.push('\n');
        out.push_str(&self.timestamp);
        out.push('\n');
        for parent in &self.parents {
            out.push_str(parent);
            out.push('\n');
        }
        out.push_str(TREE_SEPARATOR);
        out.push('\n');
        for (path, blob) in &self.tree {
            out.push_str(path);
            out.push(':');
            out.push_str(blob);
            out.push('\n');
        }
        out
    }

    /// Parse a commit record read from `commits/<hash>`.
    pub fn parse(hash: &str, text: &str) -> MiniGitResult<Self> {
        let mut lines = text.lines();

        let message = lines
            .next()
            .ok_or_else(|| corrupt(hash, "missing message line"))?
            .to_string();
        let timestamp = lines
            .next()
            .ok_or_else(|| corrupt(hash, "missing timestamp line"))?
            .to_string();

        let mut parents = Vec::new();
        let mut saw_separator = false;
        for line in lines.by_ref() {
            if line == TREE_SEPARATOR {
                saw_separator = true;
                break;
            }
            if !looks_like_hash(line) {
                return Err(corrupt(hash, "malformed parent line"));
            }
            parents.push(line.to_string());
        }
        if !saw_separator {
            return Err(corrupt(hash, "missing tree separator"));
        }

        let mut tree = BTreeMap::new();
        for line in lines {
            let (path, blob) = line
                .split_once(':')
                .ok_or_else(|| corrupt(hash, "malformed tree entry"))?;
            tree.insert(path.to_string(), blob.to_string());
        }

        Ok(Commit {
            hash: hash.to_string(),
            message,
            timestamp,
            parents,
            tree,
        })
    }

    /// The first parent, if any. `log` walks this chain.
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// True for a two-parent commit produced by concluding a merge.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

fn corrupt(hash: &str, what: &str) -> MiniGitError {
    MiniGitError::CorruptStore(format!("commit {hash}: {what}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> BTreeMap<String, String> {
        let mut tree = BTreeMap::new();
        tree.insert("b.txt".to_string(), "00000000000000bb".to_string());
        tree.insert("a.txt".to_string(), "00000000000000aa".to_string());
        tree
    }

    #[test]
    fn test_serialize_shape() {
        let commit = Commit::new(
            "add files".to_string(),
            "Thu Jun 13 08:10:34 2024".to_string(),
            vec!["1111111111111111".to_string()],
            sample_tree(),
        );
        assert_eq!(
            commit.serialize(),
            "add files\nThu Jun 13 08:10:34 2024\n1111111111111111\n---\n\
             a.txt:00000000000000aa\nb.txt:00000000000000bb\n"
        );
    }

    #[test]
    fn test_tree_entries_sorted() {
        // Insertion order must not leak into the serialization.
        let commit = Commit::new(
            "m".to_string(),
            "t".to_string(),
            Vec::new(),
            sample_tree(),
        );
        let body = commit.serialize();
        assert!(body.find("a.txt").unwrap() < body.find("b.txt").unwrap());
    }

    #[test]
    fn test_roundtrip() {
        let commit = Commit::new(
            "merge feat".to_string(),
            "Thu Jun 13 08:10:34 2024".to_string(),
            vec!["1111111111111111".to_string(), "2222222222222222".to_string()],
            sample_tree(),
        );
        let parsed = Commit::parse(&commit.hash, &commit.serialize()).unwrap();
        assert_eq!(parsed, commit);
    }

    #[test]
    fn test_roundtrip_root_commit() {
        let commit = Commit::new(
            "Initial commit".to_string(),
            "Thu Jun 13 08:10:34 2024".to_string(),
            Vec::new(),
            BTreeMap::new(),
        );
        let parsed = Commit::parse(&commit.hash, &commit.serialize()).unwrap();
        assert_eq!(parsed, commit);
        assert!(parsed.parents.is_empty());
        assert!(parsed.tree.is_empty());
    }

    #[test]
    fn test_hash_covers_all_fields() {
        let base = Commit::new("m".into(), "t".into(), Vec::new(), BTreeMap::new());
        let other_message = Commit::new("m2".into(), "t".into(), Vec::new(), BTreeMap::new());
        let other_time = Commit::new("m".into(), "t2".into(), Vec::new(), BTreeMap::new());
        let other_parent = Commit::new(
            "m".into(),
            "t".into(),
            vec!["1111111111111111".into()],
            BTreeMap::new(),
        );
        let other_tree = Commit::new("m".into(), "t".into(), Vec::new(), sample_tree());

        assert_ne!(base.hash, other_message.hash);
        assert_ne!(base.hash, other_time.hash);
        assert_ne!(base.hash, other_parent.hash);
        assert_ne!(base.hash, other_tree.hash);
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = Commit::parse("deadbeefdeadbeef", "msg\nts\n1111111111111111\n");
        assert!(matches!(err, Err(MiniGitError::CorruptStore(_))));
    }

    #[test]
    fn test_parse_malformed_parent_line() {
        let err = Commit::parse("deadbeefdeadbeef", "msg\nts\nnot-a-hash\n---\n");
        assert!(matches!(err, Err(MiniGitError::CorruptStore(_))));
    }

    #[test]
    fn test_parse_malformed_tree_entry() {
        let err = Commit::parse("deadbeefdeadbeef", "msg\nts\n---\nno-colon-here\n");
        assert!(matches!(err, Err(MiniGitError::CorruptStore(_))));
    }

    #[test]
    fn test_first_parent_and_is_merge() {
        let merge = Commit::new(
            "m".into(),
            "t".into(),
            vec!["1111111111111111".into(), "2222222222222222".into()],
            BTreeMap::new(),
        );
        assert_eq!(merge.first_parent(), Some("1111111111111111"));
        assert!(merge.is_merge());

        let root = Commit::new("m".into(), "t".into(), Vec::new(), BTreeMap::new());
        assert_eq!(root.first_parent(), None);
        assert!(!root.is_merge());
    }
}
