//! Three-way reconciliation over commit trees.
//!
//! Merging compares blob hashes, never content: two sides agree on a
//! path exactly when they name the same blob (or both omit it). The
//! resolution of each path is computed here as data; the repository
//! facade applies it (staging clean takes, writing conflict markers).
//!
//! Merge is whole-file. A path where both sides diverged from the base
//! is a conflict regardless of how the lines relate.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// How a single path reconciles across base, current, and target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Take the target side's blob: stage it.
    Stage(String),
    /// Keep the current side as-is: nothing to do.
    Keep,
    /// Both sides diverged from the base; the user must resolve.
    Conflict,
}

/// The outcome of a `merge` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "outcome")]
pub enum MergeOutcome {
    /// The target is already an ancestor of the current commit.
    UpToDate,
    /// The current commit is an ancestor of the target; the ref moved
    /// forward without a merge commit.
    FastForward {
        /// The commit the current branch now points at.
        target: String,
    },
    /// A three-way reconciliation ran.
    Merged {
        /// Paths staged from the target side.
        staged: Vec<String>,
        /// Paths written with conflict markers, not staged.
        conflicts: Vec<String>,
    },
}

/// Compute the per-path resolution for the union of three trees.
///
/// Results come back in path order. Paths where current and target agree
/// are omitted entirely; merge must never touch them.
pub fn resolve_trees(
    base: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
    target: &BTreeMap<String, String>,
) -> Vec<(String, Resolution)> {
    let mut paths: BTreeSet<&String> = BTreeSet::new();
    paths.extend(base.keys());
    paths.extend(current.keys());
    paths.extend(target.keys());

    let mut resolutions = Vec::new();
    for path in paths {
        let b = base.get(path);
        let c = current.get(path);
        let t = target.get(path);

        let resolution = if c == t {
            // Same blob or absent on both sides: no-op either way.
            continue;
        } else if c == b {
            // Only the target moved. A target-side deletion cannot be
            // staged (the index records presence only), so the current
            // file is kept; additions and edits are taken.
            match t {
                Some(hash) => Resolution::Stage(hash.clone()),
                None => Resolution::Keep,
            }
        } else if t == b {
            // Only the current side moved: keep it.
            Resolution::Keep
        } else {
            // Divergent edits, edit-vs-delete, or both-added-differently.
            Resolution::Conflict
        };

        resolutions.push((path.clone(), resolution));
    }

    resolutions
}

/// Render the conflict-marked file body for a path.
///
/// An absent side renders as empty content between its markers.
pub fn conflict_markers(current: &[u8], target: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(current.len() + target.len() + 48);
    out.extend_from_slice(b"<<<<<<< HEAD\n");
    out.extend_from_slice(current);
    out.extend_from_slice(b"\n=======\n");
    out.extend_from_slice(target);
    out.extend_from_slice(b"\n>>>>>>> incoming\n");
    out
}
