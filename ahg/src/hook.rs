//! Hook orchestration.
//!
//! Reads one event from stdin, builds the per-invocation [`Context`], routes
//! to the gate that serves the lifecycle point, and projects the resulting
//! verdict onto the exit-code contract. Decode problems always fail open: a
//! hook bug must never deadlock the agent.

use ahg_common::{HookEvent, Verdict, EXIT_ALLOW};
use tracing::{debug, warn};

use crate::context::Context;
use crate::{notify, pipeline, size_gate, stop_gate};

/// Which lifecycle hook point this invocation serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    PreMutation,
    PostMutation,
    Notification,
    SessionStop,
    SessionStart,
}

/// Run one hook invocation end to end; the return value is the process exit
/// code.
pub async fn run(point: HookPoint) -> i32 {
    let Some(event) = read_event().await else {
        return EXIT_ALLOW;
    };

    let ctx = Context::capture();
    if !ctx.config.general.enabled {
        debug!("disabled via config, allowing");
        return EXIT_ALLOW;
    }

    let verdict = dispatch(point, &ctx, &event).await;
    report(&verdict);
    verdict.exit_code()
}

/// Read and decode the stdin event, with the same 10 MB cap and fail-open
/// behavior for empty or malformed payloads.
async fn read_event() -> Option<HookEvent> {
    use tokio::io::AsyncReadExt;

    let mut input = String::new();
    if let Err(e) = tokio::io::stdin()
        .take(10 * 1024 * 1024)
        .read_to_string(&mut input)
        .await
    {
        warn!("failed to read hook input: {e}");
        return None;
    }

    let input = input.trim();
    if input.is_empty() {
        debug!("empty hook input, allowing");
        return None;
    }

    match HookEvent::from_json(input) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("failed to parse hook input: {e}, allowing");
            None
        }
    }
}

pub(crate) async fn dispatch(point: HookPoint, ctx: &Context, event: &HookEvent) -> Verdict {
    match point {
        HookPoint::PreMutation => handle_pre(ctx, event),
        HookPoint::PostMutation => handle_post(ctx, event).await,
        HookPoint::Notification => notify::dispatch(ctx, event.notification_kind()).await,
        HookPoint::SessionStop => stop_gate::run(ctx),
        HookPoint::SessionStart => handle_start(ctx).await,
    }
}

fn handle_pre(ctx: &Context, event: &HookEvent) -> Verdict {
    if event.tool_name.is_some() && !event.is_mutation_tool() {
        debug!("tool {:?} does not mutate files, allowing", event.tool_name);
        return Verdict::pass();
    }
    let Some(mutation) = event.mutation() else {
        debug!("no mutation in event, allowing");
        return Verdict::pass();
    };

    let resolved = ctx.resolve(&mutation.path);
    if let Some(reason) = ctx.skip.check(ctx.skip_view(&resolved)) {
        debug!("{}: skipped ({reason})", mutation.path.display());
        return Verdict::pass();
    }

    size_gate::evaluate(ctx, &mutation)
}

async fn handle_post(ctx: &Context, event: &HookEvent) -> Verdict {
    if event.tool_name.is_some() && !event.is_mutation_tool() {
        debug!("tool {:?} does not mutate files, allowing", event.tool_name);
        return Verdict::pass();
    }
    let Some(path) = event
        .tool_input
        .file_path
        .as_deref()
        .filter(|p| !p.is_empty())
    else {
        debug!("no file path in event, allowing");
        return Verdict::pass();
    };
    let path = std::path::Path::new(path);

    let resolved = ctx.resolve(path);
    if let Some(reason) = ctx.skip.check(ctx.skip_view(&resolved)) {
        debug!("{}: skipped ({reason})", path.display());
        return Verdict::pass();
    }

    pipeline::run(ctx, path).await
}

async fn handle_start(ctx: &Context) -> Verdict {
    debug!("session start");
    if ctx.config.notify.announce_session_start {
        let tree = ctx.tree_name().unwrap_or_else(|| "workspace".to_string());
        notify::deliver(ctx, &format!("{tree}: session started")).await;
    }
    Verdict::pass()
}

/// Violations and warnings go to stderr, one line each; stdout stays
/// reserved for informational payload.
fn report(verdict: &Verdict) {
    for warning in verdict.warnings() {
        eprintln!("[ahg] warning: {warning}");
    }
    for violation in verdict.violations() {
        eprintln!("[ahg] {violation}");
    }
}
