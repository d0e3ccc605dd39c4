//! Typed external tool invocation.
//!
//! The distinction between "tool absent" (policy degrades to a no-op) and
//! "tool ran and failed" (the stage decides whether to block) is made
//! explicit here via a PATH existence check before spawning, never inferred
//! from exit codes. Every invocation runs under a timeout so a hung linter
//! cannot stall the agent.

use ahg_common::ToolSpec;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of one external tool invocation.
#[derive(Debug)]
pub enum ToolOutcome {
    /// The program is not on PATH; callers treat this as a no-op.
    Missing,
    /// The tool ran to completion.
    Completed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The tool exceeded its deadline and was killed.
    TimedOut { after: Duration },
}

/// Run a tool against a file, from `cwd`, under `deadline`.
pub async fn run_tool(
    spec: &ToolSpec,
    file: &Path,
    cwd: &Path,
    deadline: Duration,
) -> anyhow::Result<ToolOutcome> {
    let program = match which::which(&spec.program) {
        Ok(resolved) => resolved,
        Err(_) => {
            debug!("tool '{}' not found on PATH", spec.program);
            return Ok(ToolOutcome::Missing);
        }
    };

    let args = spec.args_for(file);
    debug!("running {} {:?}", program.display(), args);

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(deadline, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            debug!("tool '{}' timed out after {:?}", spec.program, deadline);
            return Ok(ToolOutcome::TimedOut { after: deadline });
        }
    };

    Ok(ToolOutcome::Completed {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
