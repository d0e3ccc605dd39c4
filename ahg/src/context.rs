//! Per-invocation context.
//!
//! Every hook invocation captures its environment exactly once (working
//! directory, enclosing working tree, merged configuration, materialized
//! policy) and threads this value through the gates. No component reads
//! ambient process state on its own.

use ahg_common::{GuardConfig, PolicyTable, SkipRules};
use std::path::{Path, PathBuf};

use crate::git;

#[derive(Debug)]
pub struct Context {
    pub cwd: PathBuf,
    /// Root of the enclosing version-control working tree, if any.
    pub repo_root: Option<PathBuf>,
    pub config: GuardConfig,
    pub policy: PolicyTable,
    pub skip: SkipRules,
}

impl Context {
    /// Capture the context for the current process.
    pub fn capture() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::for_dir(cwd)
    }

    /// Capture the context as if running from `cwd`.
    pub fn for_dir(cwd: PathBuf) -> Self {
        let repo_root = git::working_tree_root(&cwd);
        let config = GuardConfig::load_or_default(&cwd, repo_root.as_deref());
        let policy = config.policy_table();
        let skip = config.skip_rules();
        Self {
            cwd,
            repo_root,
            config,
            policy,
            skip,
        }
    }

    /// The directory gate-relative paths resolve against: the working-tree
    /// root when inside one, the invocation cwd otherwise.
    pub fn base_dir(&self) -> &Path {
        self.repo_root.as_deref().unwrap_or(&self.cwd)
    }

    /// Absolute form of an event path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Path form used for skip-rule evaluation: relative to the base dir
    /// where possible, so rules match tree-internal components rather than
    /// whatever directories happen to contain the checkout itself.
    pub fn skip_view<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(self.base_dir()).unwrap_or(path)
    }

    /// Working-tree name for notification messages.
    pub fn tree_name(&self) -> Option<String> {
        self.base_dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}
