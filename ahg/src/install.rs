//! Hook registration in the agent's settings file.
//!
//! Idempotently wires the five `ahg` subcommands into the agent's hook
//! configuration. Self-healing friendly: safe to call on every start, never
//! creates the agent directory when the agent is not installed, backs up and
//! atomically rewrites the settings file when it does change.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// One lifecycle hook point and the command that serves it.
#[derive(Debug, Clone, Copy)]
pub struct HookSpec {
    pub event: &'static str,
    pub matcher: Option<&'static str>,
    pub command: &'static str,
}

/// Every hook point AHG serves. Mutation hooks are scoped to file-writing
/// tools; lifecycle hooks match everything.
pub const HOOK_SPECS: [HookSpec; 5] = [
    HookSpec {
        event: "PreToolUse",
        matcher: Some("Write|Edit|MultiEdit"),
        command: "ahg pre",
    },
    HookSpec {
        event: "PostToolUse",
        matcher: Some("Write|Edit|MultiEdit"),
        command: "ahg post",
    },
    HookSpec {
        event: "Notification",
        matcher: None,
        command: "ahg notify",
    },
    HookSpec {
        event: "Stop",
        matcher: None,
        command: "ahg stop",
    },
    HookSpec {
        event: "SessionStart",
        matcher: None,
        command: "ahg start",
    },
];

/// Result of hook verification/installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Every hook was already registered.
    AlreadyInstalled,
    /// These events were newly registered.
    Installed(Vec<String>),
    /// These events would be registered (dry run).
    WouldInstall(Vec<String>),
    /// The agent is not installed; nothing was touched.
    NotApplicable,
}

fn agent_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".claude"))
}

fn settings_path_in(agent_dir: &Path) -> PathBuf {
    agent_dir.join("settings.json")
}

/// Register all AHG hooks in the default agent settings location.
pub fn install_hooks(dry_run: bool) -> Result<InstallOutcome> {
    match agent_dir() {
        Some(dir) => install_hooks_at(&dir, dry_run),
        None => Ok(InstallOutcome::NotApplicable),
    }
}

/// Internal implementation that accepts the agent directory for testability.
pub fn install_hooks_at(agent_dir: &Path, dry_run: bool) -> Result<InstallOutcome> {
    if !agent_dir.exists() {
        debug!("agent not installed ({} does not exist)", agent_dir.display());
        return Ok(InstallOutcome::NotApplicable);
    }

    let settings_path = settings_path_in(agent_dir);
    let mut settings: Value = if settings_path.exists() {
        let raw = fs::read_to_string(&settings_path).context("failed to read agent settings")?;
        match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("existing settings are malformed: {e}, starting fresh");
                serde_json::json!({})
            }
        }
    } else {
        serde_json::json!({})
    };

    let missing: Vec<&HookSpec> = HOOK_SPECS
        .iter()
        .filter(|spec| !settings_has_command(&settings, spec.event, spec.command))
        .collect();

    if missing.is_empty() {
        return Ok(InstallOutcome::AlreadyInstalled);
    }
    let missing_events: Vec<String> = missing.iter().map(|s| s.event.to_string()).collect();

    if dry_run {
        return Ok(InstallOutcome::WouldInstall(missing_events));
    }

    if settings_path.exists()
        && let Err(e) = create_backup(&settings_path)
    {
        // The backup is convenience, not a prerequisite for the atomic write.
        warn!("could not create settings backup: {e}");
    }

    for spec in &missing {
        add_hook(&mut settings, spec)?;
    }

    let rendered = serde_json::to_string_pretty(&settings)?;
    atomic_write(&settings_path, rendered.as_bytes())?;
    debug!("registered hooks: {}", missing_events.join(", "));
    Ok(InstallOutcome::Installed(missing_events))
}

/// Per-event installation state, `None` when the agent is absent.
pub fn hook_status_at(agent_dir: &Path) -> Result<Option<Vec<(&'static str, bool)>>> {
    if !agent_dir.exists() {
        return Ok(None);
    }
    let settings_path = settings_path_in(agent_dir);
    let settings: Value = if settings_path.exists() {
        let raw = fs::read_to_string(&settings_path).context("failed to read agent settings")?;
        serde_json::from_str(&raw).unwrap_or_else(|_| serde_json::json!({}))
    } else {
        serde_json::json!({})
    };
    Ok(Some(
        HOOK_SPECS
            .iter()
            .map(|spec| {
                (
                    spec.event,
                    settings_has_command(&settings, spec.event, spec.command),
                )
            })
            .collect(),
    ))
}

/// `ahg install` entry point.
pub fn run_install(dry_run: bool) -> Result<()> {
    match install_hooks(dry_run)? {
        InstallOutcome::AlreadyInstalled => println!("hooks already installed"),
        InstallOutcome::Installed(events) => {
            println!("registered hooks: {}", events.join(", "));
        }
        InstallOutcome::WouldInstall(events) => {
            println!("would register hooks: {}", events.join(", "));
        }
        InstallOutcome::NotApplicable => println!("agent not installed, nothing to do"),
    }
    Ok(())
}

/// `ahg status` entry point.
pub fn run_status() -> Result<()> {
    let Some(dir) = agent_dir() else {
        println!("{}", "could not determine home directory".yellow());
        return Ok(());
    };
    match hook_status_at(&dir)? {
        None => println!("{}", "agent not installed".yellow()),
        Some(states) => {
            for (event, installed) in states {
                let state = if installed {
                    "installed".green()
                } else {
                    "missing".yellow()
                };
                println!("{event:<14} {state}");
            }
        }
    }
    Ok(())
}

/// Check whether a command is registered under an event, tolerating both the
/// nested `{matcher, hooks: [{command}]}` shape and bare `{command}` /
/// string entries.
fn settings_has_command(settings: &Value, event: &str, command: &str) -> bool {
    let Some(entries) = settings
        .get("hooks")
        .and_then(|h| h.get(event))
        .and_then(|v| v.as_array())
    else {
        return false;
    };
    for entry in entries {
        if let Some(inner) = entry.get("hooks").and_then(|h| h.as_array()) {
            for hook in inner {
                if hook
                    .get("command")
                    .and_then(|c| c.as_str())
                    .is_some_and(|c| c.contains(command))
                {
                    return true;
                }
            }
        }
        if entry
            .get("command")
            .and_then(|c| c.as_str())
            .is_some_and(|c| c.contains(command))
        {
            return true;
        }
        if entry.as_str().is_some_and(|c| c.contains(command)) {
            return true;
        }
    }
    false
}

fn add_hook(settings: &mut Value, spec: &HookSpec) -> Result<()> {
    let mut entry = serde_json::json!({
        "hooks": [
            {
                "type": "command",
                "command": spec.command
            }
        ]
    });
    if let Some(matcher) = spec.matcher {
        entry["matcher"] = Value::String(matcher.to_string());
    }

    let hooks = settings
        .as_object_mut()
        .context("settings is not an object")?
        .entry("hooks")
        .or_insert_with(|| serde_json::json!({}));
    let hooks = hooks.as_object_mut().context("hooks is not an object")?;

    let event_entry = hooks
        .entry(spec.event)
        .or_insert_with(|| serde_json::json!([]));
    if !event_entry.is_array() {
        *event_entry = serde_json::json!([]);
    }
    event_entry
        .as_array_mut()
        .context("event entry should be an array after initialization")?
        .push(entry);
    Ok(())
}

/// Write atomically via a temp file in the same directory.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().context("path has no parent directory")?;
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("failed to create temp file {temp_path:?}"))?;
    file.write_all(content)
        .with_context(|| format!("failed to write temp file {temp_path:?}"))?;
    file.sync_all().context("failed to sync temp file")?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename {temp_path:?} to {path:?}"))?;
    Ok(())
}

/// Timestamped sibling copy of the settings file.
fn create_backup(path: &Path) -> Result<PathBuf> {
    let backup_name = format!(
        "{}.bak.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    let backup_path = path
        .parent()
        .map(|p| p.join(&backup_name))
        .unwrap_or_else(|| PathBuf::from(&backup_name));
    fs::copy(path, &backup_path)
        .with_context(|| format!("failed to create backup at {backup_path:?}"))?;
    debug!("created backup: {backup_path:?}");
    Ok(backup_path)
}
