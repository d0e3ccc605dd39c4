//! Read-only queries against the version-control working tree.
//!
//! Everything here shells out to the `git` CLI; a missing binary or a
//! directory outside any working tree degrades to `None`/empty so the gates
//! fail open.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Root of the enclosing working tree, if `dir` is inside one.
pub fn working_tree_root(dir: &Path) -> Option<PathBuf> {
    git_stdout(dir, &["rev-parse", "--show-toplevel"])
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Currently checked-out branch name.
pub fn current_branch(dir: &Path) -> Option<String> {
    git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).filter(|s| !s.is_empty())
}

/// Files changed relative to the baseline: staged, unstaged, and untracked,
/// de-duplicated, paths relative to the working-tree root.
///
/// Parsed from `git status --porcelain`, which covers all three states in
/// one call; rename entries contribute their new path.
pub fn changed_files(root: &Path) -> Vec<PathBuf> {
    let Some(raw) = git_stdout(root, &["status", "--porcelain"]) else {
        debug!("git status unavailable in {}", root.display());
        return Vec::new();
    };

    let mut files = BTreeSet::new();
    for line in raw.lines() {
        if line.len() < 4 {
            continue;
        }
        // Format: "XY path" or "XY old -> new" for renames.
        let path_part = &line[3..];
        let path = match path_part.split_once(" -> ") {
            Some((_, new)) => new,
            None => path_part,
        };
        let path = path.trim().trim_matches('"');
        if !path.is_empty() {
            files.insert(PathBuf::from(path));
        }
    }
    files.into_iter().collect()
}

/// Whether the working tree's ignore rules exclude a path.
pub fn is_ignored(root: &Path, path: &Path) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .arg("check-ignore")
        .arg("-q")
        .arg(path)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
