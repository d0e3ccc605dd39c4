//! Violation model and the exit-code contract.
//!
//! Gates and pipeline stages produce [`Violation`] values; the orchestrator
//! accumulates them into a [`Verdict`] and only the process boundary projects
//! that to an exit code. Nothing here is an `Error`: a violation is a
//! first-class outcome the agent is expected to act on.

use std::path::{Path, PathBuf};

/// Exit code for "allowed / informational": the agent proceeds.
pub const EXIT_ALLOW: i32 = 0;

/// Exit code for "warning": the agent proceeds, but the detail is surfaced
/// into its context.
pub const EXIT_WARN: i32 = 1;

/// Exit code for "blocking violation": the agent must not proceed until the
/// violation is resolved.
pub const EXIT_BLOCK: i32 = 2;

/// What kind of rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The mutation would leave the file over its line limit.
    SizeExceeded,
    /// The linter ran and reported problems.
    LintFailed,
    /// No test file exists for a mutated source file.
    TestMissing,
    /// The associated test file ran and failed.
    TestFailed,
    /// A forbidden marker token is present in a changed file.
    ForbiddenToken,
    /// A debug-breakpoint idiom is present in a changed file.
    DebugArtifact,
}

impl ViolationKind {
    /// Short human label used in stderr reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SizeExceeded => "size limit",
            Self::LintFailed => "lint failed",
            Self::TestMissing => "test missing",
            Self::TestFailed => "test failed",
            Self::ForbiddenToken => "forbidden token",
            Self::DebugArtifact => "debug artifact",
        }
    }
}

/// One rule violation, tied to a file, with human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub file: PathBuf,
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, file: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.kind.label(),
            self.file.display(),
            self.detail
        )
    }
}

/// Accumulated outcome of one hook invocation.
///
/// Violations block (exit 2); warnings surface without blocking (exit 1);
/// an empty verdict allows (exit 0).
#[derive(Debug, Clone, Default)]
pub struct Verdict {
    violations: Vec<Violation>,
    warnings: Vec<String>,
}

impl Verdict {
    /// An empty, allowing verdict.
    pub fn pass() -> Self {
        Self::default()
    }

    /// A verdict carrying a single blocking violation.
    pub fn block(violation: Violation) -> Self {
        let mut verdict = Self::default();
        verdict.push(violation);
        verdict
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another verdict into this one, preserving order.
    pub fn merge(&mut self, other: Verdict) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
    }

    pub fn is_blocking(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Violations attached to a given file, in report order.
    pub fn violations_for(&self, file: &Path) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.file == file).collect()
    }

    /// Project the verdict onto the exit-code contract.
    pub fn exit_code(&self) -> i32 {
        if !self.violations.is_empty() {
            EXIT_BLOCK
        } else if !self.warnings.is_empty() {
            EXIT_WARN
        } else {
            EXIT_ALLOW
        }
    }
}
