//! Post-mutation automation pipeline.
//!
//! Fixed stage order: executable-bit normalization, format, lint, associated
//! test execution. The first blocking failure short-circuits the rest.
//! Formatting problems only warn; lint and test problems block, because they
//! usually indicate logic the agent still has to address.

use ahg_common::util::{count_lines, final_extension, has_interpreter_directive, tail_lines};
use ahg_common::{policy, PolicyEntry, Verdict, Violation, ViolationKind};
use std::path::Path;
use tracing::{debug, warn};

use crate::context::Context;
use crate::git;
use crate::tools::{run_tool, ToolOutcome};

/// Run the pipeline for a file that was just mutated.
///
/// `event_path` is the path as the event named it; skip rules have already
/// been applied by the orchestrator.
pub async fn run(ctx: &Context, event_path: &Path) -> Verdict {
    let mut verdict = Verdict::pass();

    let resolved = ctx.resolve(event_path);
    if !resolved.is_file() {
        debug!("{}: not on disk, nothing to automate", resolved.display());
        return verdict;
    }
    let Some(entry) = ctx.policy.lookup_path(event_path) else {
        debug!("{}: unmapped extension, pipeline passes", event_path.display());
        return verdict;
    };

    let content = std::fs::read_to_string(&resolved).ok();

    if ctx.config.pipeline.skip_oversized {
        let current = content.as_deref().map(count_lines).unwrap_or(0);
        if current > entry.line_limit {
            debug!(
                "{}: {} lines over limit {}, pipeline skipped by policy",
                event_path.display(),
                current,
                entry.line_limit
            );
            return verdict;
        }
    }

    // Stage 1: executable bit. Never blocks.
    if let Some(ext) = final_extension(event_path) {
        match normalize_exec_bit(&resolved, ext, content.as_deref()) {
            Ok(true) => debug!("{}: marked executable", event_path.display()),
            Ok(false) => {}
            Err(e) => verdict.warn(format!(
                "could not mark {} executable: {e}",
                event_path.display()
            )),
        }
    }

    // Stage 2: format. Never blocks.
    if let Some(outcome) = invoke(ctx, entry.formatter.as_deref(), &resolved).await {
        match outcome {
            ToolOutcome::Completed { exit_code, stdout, stderr, .. } if exit_code != 0 => {
                verdict.warn(format!(
                    "formatter exited {exit_code} on {}: {}",
                    event_path.display(),
                    summarize(&stdout, &stderr)
                ));
            }
            ToolOutcome::TimedOut { after } => {
                verdict.warn(format!(
                    "formatter timed out after {after:?} on {}",
                    event_path.display()
                ));
            }
            _ => {}
        }
    }

    // Stage 3: lint. Blocks.
    if let Some(outcome) = invoke(ctx, entry.linter.as_deref(), &resolved).await {
        match outcome {
            ToolOutcome::Completed { exit_code, stdout, stderr, .. } if exit_code != 0 => {
                verdict.push(Violation::new(
                    ViolationKind::LintFailed,
                    event_path.to_path_buf(),
                    format!("exit {exit_code}: {}", summarize(&stdout, &stderr)),
                ));
                return verdict;
            }
            ToolOutcome::TimedOut { after } => {
                verdict.push(Violation::new(
                    ViolationKind::LintFailed,
                    event_path.to_path_buf(),
                    format!("linter timed out after {after:?}"),
                ));
                return verdict;
            }
            _ => {}
        }
    }

    // Stage 4: associated test. Blocks on a missing or failing test file.
    verdict.merge(run_test_stage(ctx, entry, event_path).await);
    verdict
}

/// Resolve the first existing, non-ignored test candidate and run it alone.
async fn run_test_stage(ctx: &Context, entry: &PolicyEntry, event_path: &Path) -> Verdict {
    let mut verdict = Verdict::pass();
    if entry.test_patterns.is_empty() {
        return verdict;
    }

    let candidates = entry.test_candidates(event_path, ctx.policy.test_root());
    let existing = candidates.iter().find(|candidate| {
        let on_disk = ctx.base_dir().join(candidate);
        if !on_disk.is_file() {
            return false;
        }
        match &ctx.repo_root {
            Some(root) => !git::is_ignored(root, candidate),
            None => true,
        }
    });

    let Some(test_file) = existing else {
        let expected = candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        verdict.push(Violation::new(
            ViolationKind::TestMissing,
            event_path.to_path_buf(),
            format!("expected one of: {expected}"),
        ));
        return verdict;
    };

    let test_abs = ctx.base_dir().join(test_file);
    if let Some(outcome) = invoke(ctx, entry.test_runner.as_deref(), &test_abs).await {
        match outcome {
            ToolOutcome::Completed { exit_code, stdout, stderr, .. } if exit_code != 0 => {
                verdict.push(Violation::new(
                    ViolationKind::TestFailed,
                    test_file.clone(),
                    format!("exit {exit_code}: {}", summarize(&stdout, &stderr)),
                ));
            }
            ToolOutcome::TimedOut { after } => {
                verdict.push(Violation::new(
                    ViolationKind::TestFailed,
                    test_file.clone(),
                    format!("test run timed out after {after:?}"),
                ));
            }
            _ => {}
        }
    }
    verdict
}

/// Run the tool behind an optional identifier; `None` when the stage has
/// nothing to do: no identifier, unknown identifier, tool absent, or spawn
/// error, all of which degrade to a no-op.
async fn invoke(ctx: &Context, tool_id: Option<&str>, file: &Path) -> Option<ToolOutcome> {
    let id = tool_id?;
    let Some(spec) = ctx.config.tool(id) else {
        debug!("tool identifier '{id}' has no command mapping, skipping");
        return None;
    };
    match run_tool(&spec, file, ctx.base_dir(), ctx.config.tool_timeout()).await {
        Ok(ToolOutcome::Missing) => None,
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("failed to run tool '{id}': {e}");
            None
        }
    }
}

fn summarize(stdout: &str, stderr: &str) -> String {
    let pick = if stderr.trim().is_empty() { stdout } else { stderr };
    let tail = tail_lines(pick.trim(), 10);
    if tail.is_empty() {
        "(no output)".to_string()
    } else {
        tail
    }
}

/// Mark scripts executable: always for the shell set, shebang-gated for the
/// interpreter set. Returns whether the mode changed.
fn normalize_exec_bit(path: &Path, ext: &str, content: Option<&str>) -> std::io::Result<bool> {
    let eligible = policy::always_executable(ext)
        || (policy::shebang_executable(ext)
            && content.is_some_and(has_interpreter_directive));
    if !eligible {
        return Ok(false);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        let mode = permissions.mode();
        let wanted = mode | 0o111;
        if wanted == mode {
            return Ok(false);
        }
        permissions.set_mode(wanted);
        std::fs::set_permissions(path, permissions)?;
        Ok(true)
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(false)
    }
}
