//! Walking the commit DAG.
//!
//! Parent edges are stored as hashes and loaded on demand, so the
//! filesystem acts as the arena: no commit ever holds a pointer to
//! another, and cycles cannot form because parents always refer to
//! already-written commits.

use std::collections::HashSet;

use crate::error::MiniGitResult;
use crate::object::ObjectStore;

/// All commits reachable from `start` by parent edges, including `start`
/// itself. Iterative DFS; each commit is read at most once.
pub fn ancestors(store: &ObjectStore, start: &str) -> MiniGitResult<HashSet<String>> {
    let mut seen = HashSet::new();
    let mut stack = vec![start.to_string()];

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let commit = store.get_commit(&current)?;
        stack.extend(commit.parents.iter().cloned());
    }

    Ok(seen)
}

/// A common ancestor of `a` and `b`: the first commit reached from `b`
/// that is also an ancestor of `a`.
///
/// On linear and single-merge histories this is the lowest common
/// ancestor. On criss-cross histories the DFS may surface a common
/// ancestor that is not the lowest; merge results are still correct,
/// just computed against an older base.
pub fn lca(store: &ObjectStore, a: &str, b: &str) -> MiniGitResult<Option<String>> {
    let reachable_from_a = ancestors(store, a)?;

    let mut seen = HashSet::new();
    let mut stack = vec![b.to_string()];

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if reachable_from_a.contains(&current) {
            return Ok(Some(current));
        }
        let commit = store.get_commit(&current)?;
        stack.extend(commit.parents.iter().cloned());
    }

    Ok(None)
}
