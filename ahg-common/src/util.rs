//! Shared utilities for AHG.

use std::path::Path;

/// Count the logical lines of a text blob.
///
/// Matches `str::lines` semantics: a trailing newline does not start a new
/// line, and the empty string has zero lines. All size-gate arithmetic goes
/// through this function so the whole-file and spliced counts agree.
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}

/// The final extension of a path, if any.
///
/// Policy lookup is by literal final extension only: `archive.tar.gz` is
/// "gz", `types.d.ts` is "ts" (the `.d.ts` case is handled by the filename
/// skip patterns, not here).
pub fn final_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Whether the content opens with an interpreter directive (`#!...`).
pub fn has_interpreter_directive(content: &str) -> bool {
    content.lines().next().is_some_and(|line| line.starts_with("#!"))
}

/// Cheap binary sniff: NUL byte in the leading window.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(8192).any(|&b| b == 0)
}

/// Last `max` lines of a tool's output, for violation detail.
pub fn tail_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max);
    lines[start..].join("\n")
}
