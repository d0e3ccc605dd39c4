//! Session-end stop gate.
//!
//! Scans every file changed in the working tree for forbidden marker tokens
//! and debug-breakpoint idioms. Only changed files are in scope: pre-existing
//! markers elsewhere in the tree are not this session's problem.

use ahg_common::policy::{debug_artifact_pattern, LanguageFamily};
use ahg_common::util::{final_extension, looks_binary};
use ahg_common::{Verdict, Violation, ViolationKind};
use std::path::Path;
use tracing::debug;

use crate::context::Context;
use crate::git;

/// Scan the session's changed files; any finding blocks the stop.
pub fn run(ctx: &Context) -> Verdict {
    let mut verdict = Verdict::pass();

    let Some(root) = ctx.repo_root.as_deref() else {
        debug!("not inside a working tree, stop gate passes");
        return verdict;
    };

    for rel in git::changed_files(root) {
        if let Some(reason) = ctx.skip.check(&rel) {
            debug!("{}: skipped ({reason})", rel.display());
            continue;
        }
        let Ok(bytes) = std::fs::read(root.join(&rel)) else {
            // Deleted or unreadable; nothing to scan.
            continue;
        };
        if looks_binary(&bytes) {
            continue;
        }
        let Ok(content) = String::from_utf8(bytes) else {
            continue;
        };
        scan_file(ctx, &rel, &content, &mut verdict);
    }

    verdict
}

fn scan_file(ctx: &Context, rel: &Path, content: &str, verdict: &mut Verdict) {
    for token in &ctx.config.stop.forbidden_tokens {
        let lines = matching_lines(content, |line| line.contains(token.as_str()));
        if !lines.is_empty() {
            verdict.push(Violation::new(
                ViolationKind::ForbiddenToken,
                rel.to_path_buf(),
                format!("'{token}' at line(s) {}", render_lines(&lines)),
            ));
        }
    }

    if let Some(re) = final_extension(rel)
        .and_then(|ext| family_for(ctx, ext))
        .and_then(debug_artifact_pattern)
    {
        let lines = matching_lines(content, |line| re.is_match(line));
        if !lines.is_empty() {
            verdict.push(Violation::new(
                ViolationKind::DebugArtifact,
                rel.to_path_buf(),
                format!("breakpoint idiom at line(s) {}", render_lines(&lines)),
            ));
        }
    }
}

/// Language family for an extension: the policy table's entry when mapped,
/// otherwise a fixed fallback so families without gating policy (Ruby, for
/// one) still get their artifacts caught.
fn family_for(ctx: &Context, ext: &str) -> Option<LanguageFamily> {
    if let Some(entry) = ctx.policy.lookup(ext) {
        return Some(entry.family);
    }
    match ext {
        "rb" => Some(LanguageFamily::Ruby),
        "mjs" | "cjs" => Some(LanguageFamily::JavaScript),
        _ => None,
    }
}

fn matching_lines(content: &str, pred: impl Fn(&str) -> bool) -> Vec<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| pred(line))
        .map(|(i, _)| i + 1)
        .collect()
}

fn render_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
