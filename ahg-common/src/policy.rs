//! Extension policy table and skip rules.
//!
//! The table is a data-driven registry: adding a language is a data change
//! (built-in entry or project config), never a new match arm in gate code.
//! Lookup is by the file's literal final extension, case-sensitive; unmapped
//! extensions fall through with no gating at all.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::util::final_extension;

/// Conventional directory test candidates are resolved under.
pub const DEFAULT_TEST_ROOT: &str = "tests";

/// Language family, used for debug-artifact scanning and shebang rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageFamily {
    Python,
    JavaScript,
    Ruby,
    Rust,
    Go,
    Shell,
    Other,
}

/// Per-extension policy: size threshold, tool identifiers, test naming.
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    /// Inclusive upper bound on line count; strictly greater blocks.
    pub line_limit: usize,
    /// Formatter tool identifier; absent means the format stage no-ops.
    pub formatter: Option<String>,
    /// Linter tool identifier; absent means the lint stage no-ops.
    pub linter: Option<String>,
    /// Test runner tool identifier; absent means found tests are not run.
    pub test_runner: Option<String>,
    /// Test basename templates (`{stem}` placeholder), resolved under the
    /// test root. Empty means the extension keeps tests inline and the test
    /// stage is skipped entirely.
    pub test_patterns: Vec<String>,
    pub family: LanguageFamily,
}

impl PolicyEntry {
    /// Expand the test-file candidates for a source path, in declaration
    /// order. First existing candidate wins at the call site.
    pub fn test_candidates(&self, source: &Path, test_root: &str) -> Vec<PathBuf> {
        let Some(stem) = source.file_stem().and_then(|s| s.to_str()) else {
            return Vec::new();
        };
        self.test_patterns
            .iter()
            .map(|pattern| Path::new(test_root).join(pattern.replace("{stem}", stem)))
            .collect()
    }
}

/// Registry mapping final extension to policy.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: HashMap<String, PolicyEntry>,
    test_root: String,
}

impl PolicyTable {
    /// The built-in table. Project configuration may override thresholds,
    /// replace entries, or add new extensions on top of this.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "py".to_string(),
            PolicyEntry {
                line_limit: 400,
                formatter: Some("ruff-format".to_string()),
                linter: Some("ruff-check".to_string()),
                test_runner: Some("pytest".to_string()),
                test_patterns: vec!["test_{stem}.py".to_string(), "{stem}_test.py".to_string()],
                family: LanguageFamily::Python,
            },
        );
        for ext in ["ts", "tsx", "js", "jsx"] {
            entries.insert(
                ext.to_string(),
                PolicyEntry {
                    line_limit: 300,
                    formatter: Some("prettier".to_string()),
                    linter: Some("eslint".to_string()),
                    test_runner: Some("vitest".to_string()),
                    test_patterns: vec![
                        format!("{{stem}}.test.{ext}"),
                        format!("{{stem}}.spec.{ext}"),
                    ],
                    family: LanguageFamily::JavaScript,
                },
            );
        }
        entries.insert(
            "sh".to_string(),
            PolicyEntry {
                line_limit: 256,
                formatter: Some("shfmt".to_string()),
                linter: Some("shellcheck".to_string()),
                test_runner: Some("bats".to_string()),
                test_patterns: vec!["{stem}.bats".to_string()],
                family: LanguageFamily::Shell,
            },
        );
        entries.insert(
            "go".to_string(),
            PolicyEntry {
                line_limit: 500,
                formatter: Some("gofmt".to_string()),
                linter: Some("govet".to_string()),
                // Go tests live next to their source, not under the test
                // root, so the test stage is skipped for Go.
                test_runner: None,
                test_patterns: Vec::new(),
                family: LanguageFamily::Go,
            },
        );
        entries.insert(
            "rs".to_string(),
            PolicyEntry {
                line_limit: 500,
                formatter: Some("rustfmt".to_string()),
                linter: None,
                test_runner: None,
                test_patterns: Vec::new(),
                family: LanguageFamily::Rust,
            },
        );
        Self {
            entries,
            test_root: DEFAULT_TEST_ROOT.to_string(),
        }
    }

    /// Look up the policy for a path by its final extension.
    pub fn lookup_path(&self, path: &Path) -> Option<&PolicyEntry> {
        final_extension(path).and_then(|ext| self.lookup(ext))
    }

    /// Exact, case-sensitive lookup by extension.
    pub fn lookup(&self, ext: &str) -> Option<&PolicyEntry> {
        self.entries.get(ext)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, ext: impl Into<String>, entry: PolicyEntry) {
        self.entries.insert(ext.into(), entry);
    }

    /// Override just the line limit. An unmapped extension gains a
    /// size-gate-only entry (no tools, no tests).
    pub fn set_line_limit(&mut self, ext: &str, limit: usize) {
        match self.entries.get_mut(ext) {
            Some(entry) => entry.line_limit = limit,
            None => {
                self.entries.insert(
                    ext.to_string(),
                    PolicyEntry {
                        line_limit: limit,
                        formatter: None,
                        linter: None,
                        test_runner: None,
                        test_patterns: Vec::new(),
                        family: LanguageFamily::Other,
                    },
                );
            }
        }
    }

    pub fn test_root(&self) -> &str {
        &self.test_root
    }

    pub fn set_test_root(&mut self, root: impl Into<String>) {
        self.test_root = root.into();
    }

    /// Test-file candidates for a source path under this table's test root.
    pub fn test_candidates(&self, source: &Path) -> Vec<PathBuf> {
        self.lookup_path(source)
            .map(|entry| entry.test_candidates(source, &self.test_root))
            .unwrap_or_default()
    }
}

/// Why a path was skipped, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Directory(String),
    Filename(String),
    Extension(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(d) => write!(f, "directory '{d}'"),
            Self::Filename(p) => write!(f, "filename pattern '{p}'"),
            Self::Extension(e) => write!(f, "extension '{e}'"),
        }
    }
}

/// Paths exempt from all gating and automation.
///
/// Evaluated before any gate touches a path: generated trees, vendored code,
/// entry points, lockfiles, declaration files, and the test files themselves.
#[derive(Debug, Clone)]
pub struct SkipRules {
    dirs: Vec<String>,
    files: Vec<glob::Pattern>,
    extensions: Vec<String>,
}

impl SkipRules {
    pub fn builtin() -> Self {
        let dirs = [
            "node_modules",
            "vendor",
            "dist",
            "build",
            "target",
            ".git",
            "__pycache__",
            "migrations",
            ".venv",
        ];
        let files = [
            "__init__.py",
            "setup.py",
            "conftest.py",
            "admin.py",
            "urls.py",
            "apps.py",
            "manage.py",
            "*.d.ts",
            "package-lock.json",
            "yarn.lock",
            "Cargo.lock",
            "poetry.lock",
            "test_*.py",
            "*_test.py",
            "*.test.*",
            "*.spec.*",
        ];
        let extensions = [
            "md", "txt", "rst", "json", "toml", "yaml", "yml", "html", "css", "scss", "svg",
            "csv", "xml", "ini", "cfg", "lock",
        ];
        let mut rules = Self {
            dirs: dirs.iter().map(|s| s.to_string()).collect(),
            files: Vec::new(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
        };
        rules.extend_files(files.iter().copied());
        rules
    }

    /// Add project-configured skip entries on top of the builtins.
    pub fn extend(
        &mut self,
        dirs: impl IntoIterator<Item = String>,
        files: impl IntoIterator<Item = String>,
        extensions: impl IntoIterator<Item = String>,
    ) {
        self.dirs.extend(dirs);
        self.extend_files(files);
        self.extensions.extend(extensions);
    }

    fn extend_files<S: AsRef<str>>(&mut self, patterns: impl IntoIterator<Item = S>) {
        for raw in patterns {
            match glob::Pattern::new(raw.as_ref()) {
                Ok(pattern) => self.files.push(pattern),
                Err(e) => tracing::warn!("invalid skip pattern '{}': {}", raw.as_ref(), e),
            }
        }
    }

    /// Check a path against all three rule sets.
    pub fn check(&self, path: &Path) -> Option<SkipReason> {
        // Directory components, excluding the file name itself.
        let mut components: Vec<&str> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        components.pop();
        for component in components {
            if self.dirs.iter().any(|d| d == component) {
                return Some(SkipReason::Directory(component.to_string()));
            }
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            for pattern in &self.files {
                if pattern.matches(name) {
                    return Some(SkipReason::Filename(pattern.as_str().to_string()));
                }
            }
        }

        if let Some(ext) = final_extension(path)
            && self.extensions.iter().any(|e| e == ext)
        {
            return Some(SkipReason::Extension(ext.to_string()));
        }

        None
    }
}

/// Extensions that are always marked executable after a mutation.
pub fn always_executable(ext: &str) -> bool {
    matches!(ext, "sh" | "bash")
}

/// Extensions marked executable only when the file opens with a shebang.
pub fn shebang_executable(ext: &str) -> bool {
    matches!(ext, "py" | "rb" | "pl" | "js")
}

/// Debug-breakpoint idiom for a language family, if it has one.
pub fn debug_artifact_pattern(family: LanguageFamily) -> Option<&'static Regex> {
    static PYTHON: OnceLock<Regex> = OnceLock::new();
    static JAVASCRIPT: OnceLock<Regex> = OnceLock::new();
    static RUBY: OnceLock<Regex> = OnceLock::new();
    static RUST: OnceLock<Regex> = OnceLock::new();
    static GO: OnceLock<Regex> = OnceLock::new();

    match family {
        LanguageFamily::Python => Some(PYTHON.get_or_init(|| {
            Regex::new(r"\b(?:breakpoint\(\)|pdb\.set_trace\(\)|ipdb\.set_trace\(\))").unwrap()
        })),
        LanguageFamily::JavaScript => {
            Some(JAVASCRIPT.get_or_init(|| Regex::new(r"(?m)^\s*debugger\s*;?\s*$").unwrap()))
        }
        LanguageFamily::Ruby => {
            Some(RUBY.get_or_init(|| Regex::new(r"\bbinding\.pry\b").unwrap()))
        }
        LanguageFamily::Rust => Some(RUST.get_or_init(|| Regex::new(r"\bdbg!\(").unwrap())),
        LanguageFamily::Go => {
            Some(GO.get_or_init(|| Regex::new(r"runtime\.Breakpoint\(\)").unwrap()))
        }
        LanguageFamily::Shell | LanguageFamily::Other => None,
    }
}
