//! .minigitprotect — user-configurable protection rules for checkout.
//!
//! Materializing a commit removes working-tree files the commit does not
//! track. The protect list names files that must survive that sweep —
//! build artifacts, editor state, anything co-located with the working
//! copy but outside version control. Nothing tool-specific is built in;
//! users own the list.
//!
//! Format, shared with the rest of the dotfile family:
//! - Blank lines are ignored
//! - Lines starting with `#` are comments
//! - Plain names match a filename exactly
//! - Glob patterns (`*.o`, `?.log`) match against filenames
//!
//! The repository directory and `.minigitprotect` itself are always
//! protected.

use std::fs;
use std::path::Path;

/// Files that are ALWAYS protected, regardless of list contents.
const ALWAYS_PROTECTED: &[&str] = &[".minigit", ".minigitprotect"];

/// Name of the protect-list file at the worktree root.
pub const PROTECT_FILE: &str = ".minigitprotect";

/// A parsed set of protection rules.
#[derive(Debug, Clone)]
pub struct ProtectList {
    /// Exact filenames to keep.
    names: Vec<String>,
    /// Glob patterns matched against filenames.
    globs: Vec<String>,
}

impl ProtectList {
    /// Load from `.minigitprotect` at the worktree root, or fall back to
    /// the built-in minimum.
    pub fn load(worktree_root: &Path) -> Self {
        let path = worktree_root.join(PROTECT_FILE);
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                return Self::parse(&content);
            }
        }
        Self::defaults()
    }

    /// The built-in minimum: only the repository's own files.
    pub fn defaults() -> Self {
        ProtectList {
            names: ALWAYS_PROTECTED.iter().map(|s| s.to_string()).collect(),
            globs: Vec::new(),
        }
    }

    /// Parse protect-list content into rules.
    ///
    /// Enforces safety limits: max 1000 rules, max 1024 chars per pattern.
    pub fn parse(content: &str) -> Self {
        const MAX_RULES: usize = 1000;
        const MAX_PATTERN_LEN: usize = 1024;

        let mut names: Vec<String> = ALWAYS_PROTECTED.iter().map(|s| s.to_string()).collect();
        let mut globs = Vec::new();
        let mut count = 0;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if count >= MAX_RULES || trimmed.len() > MAX_PATTERN_LEN {
                continue;
            }
            count += 1;

            if trimmed.contains('*') || trimmed.contains('?') {
                globs.push(trimmed.to_string());
            } else {
                names.push(trimmed.to_string());
            }
        }

        ProtectList { names, globs }
    }

    /// Should this filename survive a materialization sweep?
    pub fn is_protected(&self, filename: &str) -> bool {
        self.names.iter().any(|n| n == filename)
            || self.globs.iter().any(|pattern| glob_match(pattern, filename))
    }
}

/// Simple glob matching: `*` matches any characters, `?` matches one character.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let mut pi = 0;
    let mut ti = 0;
    let mut star_p = None;
    let mut star_t = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star_p = Some(pi);
            star_t = Some(ti);
            pi += 1;
        } else if let Some(sp) = star_p {
            pi = sp + 1;
            let st = star_t.unwrap() + 1;
            star_t = Some(st);
            ti = st;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }

    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_protect_repo_files() {
        let list = ProtectList::defaults();
        assert!(list.is_protected(".minigit"));
        assert!(list.is_protected(".minigitprotect"));
        assert!(!list.is_protected("a.txt"));
    }

    #[test]
    fn test_parse_blank_and_comments() {
        let list = ProtectList::parse("# comment\n\n  \n");
        assert!(list.is_protected(".minigit"));
        assert!(!list.is_protected("anything"));
    }

    #[test]
    fn test_parse_exact_names() {
        let list = ProtectList::parse("Makefile\nnotes.md\n");
        assert!(list.is_protected("Makefile"));
        assert!(list.is_protected("notes.md"));
        assert!(!list.is_protected("makefile"));
    }

    #[test]
    fn test_parse_glob_patterns() {
        let list = ProtectList::parse("*.o\nbuild-?\n");
        assert!(list.is_protected("main.o"));
        assert!(list.is_protected("build-1"));
        assert!(!list.is_protected("main.c"));
        assert!(!list.is_protected("build-12"));
    }

    #[test]
    fn test_always_protected_with_custom_list() {
        let list = ProtectList::parse("custom.bin\n");
        assert!(list.is_protected(".minigit"));
        assert!(list.is_protected("custom.bin"));
    }

    #[test]
    fn test_glob_match_star() {
        assert!(glob_match("*.o", "foo.o"));
        assert!(!glob_match("*.o", "foo.obj"));
        assert!(glob_match("tmp_*", "tmp_scratch"));
    }

    #[test]
    fn test_glob_match_question() {
        assert!(glob_match("?.log", "a.log"));
        assert!(!glob_match("?.log", "ab.log"));
    }

    #[test]
    fn test_load_fallback_to_defaults() {
        let list = ProtectList::load(Path::new("/tmp/nonexistent_minigit_repo_xyz"));
        assert!(list.is_protected(".minigit"));
        assert!(!list.is_protected("a.txt"));
    }
}
