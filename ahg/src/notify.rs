//! Notification router.
//!
//! Composes a short session-state message and hands it to the configured
//! announcer chain, first success wins. Notification is a best-effort side
//! channel: every failure mode here degrades to "carry on", never to a
//! blocking exit.

use ahg_common::{AnnouncerConfig, NotificationKind, Verdict};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::context::Context;
use crate::git;

/// Deadline for a single announcer attempt.
const ANNOUNCE_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum AnnounceError {
    #[error("failed to spawn announcer: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("announcer exited with status {0}")]
    Status(i32),
    #[error("announcer timed out")]
    Timeout,
    #[error("webhook delivery failed: {0}")]
    Http(String),
}

/// Route a notification event. Always allows.
pub async fn dispatch(ctx: &Context, kind: NotificationKind) -> Verdict {
    let message = compose(ctx, kind);
    deliver(ctx, &message).await;
    Verdict::pass()
}

/// Deliver an arbitrary message through the announcer chain.
pub async fn deliver(ctx: &Context, message: &str) {
    for announcer in &ctx.config.notify.announcers {
        match announce(announcer, message).await {
            Ok(()) => {
                debug!("announced via {announcer:?}");
                return;
            }
            Err(e) => warn!("announcer failed, trying next: {e}"),
        }
    }
    warn!("all announcers failed for: {message}");
}

/// One-line message with ambient working-tree context.
fn compose(ctx: &Context, kind: NotificationKind) -> String {
    let tree = ctx.tree_name().unwrap_or_else(|| "workspace".to_string());
    let branch = ctx
        .repo_root
        .as_deref()
        .and_then(git::current_branch)
        .map(|b| format!(" ({b})"))
        .unwrap_or_default();
    let state = match kind {
        NotificationKind::Idle => "agent is waiting for input",
        NotificationKind::PermissionRequest => "agent needs permission",
        NotificationKind::Stop => "session finished",
        NotificationKind::Other => "agent notification",
    };
    format!("{tree}{branch}: {state}")
}

async fn announce(config: &AnnouncerConfig, message: &str) -> Result<(), AnnounceError> {
    match config {
        AnnouncerConfig::Command { program, args } => {
            let mut substituted = false;
            let mut concrete: Vec<String> = args
                .iter()
                .map(|arg| {
                    if arg.contains("{message}") {
                        substituted = true;
                        arg.replace("{message}", message)
                    } else {
                        arg.clone()
                    }
                })
                .collect();
            if !substituted {
                concrete.push(message.to_string());
            }

            let mut cmd = Command::new(program);
            cmd.args(&concrete)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true);
            let status = timeout(ANNOUNCE_DEADLINE, cmd.status())
                .await
                .map_err(|_| AnnounceError::Timeout)??;
            if status.success() {
                Ok(())
            } else {
                Err(AnnounceError::Status(status.code().unwrap_or(-1)))
            }
        }
        AnnouncerConfig::Webhook { url } => {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .timeout_global(Some(ANNOUNCE_DEADLINE))
                .build()
                .into();
            agent
                .post(url)
                .send_json(serde_json::json!({ "text": message }))
                .map_err(|e| AnnounceError::Http(e.to_string()))?;
            Ok(())
        }
        AnnouncerConfig::Log => {
            tracing::info!("{message}");
            Ok(())
        }
    }
}
