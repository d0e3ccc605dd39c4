//! Agent hook event protocol.
//!
//! Defines the JSON structure the agent writes to the hook's stdin. Every
//! field is optional: a malformed or partial event must degrade to "not
//! applicable, allow" rather than error, so decoding is deliberately lenient
//! and the typed accessors below return `Option`.

use serde::Deserialize;
use std::path::PathBuf;

/// One event record per hook invocation.
///
/// The lifecycle hook point (pre-mutation, post-mutation, notification,
/// session stop/start) is conveyed by the subcommand the agent registered,
/// not by the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    /// The tool being invoked (e.g., "Write", "Edit"); mutation events only.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Tool-specific input.
    #[serde(default)]
    pub tool_input: ToolInput,
    /// Notification events carry the notification kind instead.
    #[serde(default)]
    pub notification_type: Option<String>,
    /// Optional session ID.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Working directory the agent reports, if any.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Tool-specific input for file mutations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    /// Target file, absolute or working-tree-relative.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Full replacement text (whole-file write).
    #[serde(default)]
    pub content: Option<String>,
    /// Replaced span (partial edit).
    #[serde(default)]
    pub old_string: Option<String>,
    /// Replacement span (partial edit).
    #[serde(default)]
    pub new_string: Option<String>,
}

/// The proposed change, in exactly one of its two forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Whole-file write with the complete new content.
    Rewrite(String),
    /// Partial edit replacing `old` with `new`.
    Splice { old: String, new: String },
}

/// Typed view of a mutation event.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub path: PathBuf,
    pub change: Change,
}

impl HookEvent {
    /// Parse an event from the raw stdin payload.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether this event's tool mutates a file.
    pub fn is_mutation_tool(&self) -> bool {
        matches!(self.tool_name.as_deref(), Some("Write") | Some("Edit"))
    }

    /// Extract the mutation this event proposes, if it proposes one.
    ///
    /// Exactly one of `content` or (`old_string`,`new_string`) is populated
    /// for a well-formed mutation. When an agent sends both anyway the
    /// whole-file content wins, since it fully determines the result. Events
    /// with no file path or neither form are not mutations.
    pub fn mutation(&self) -> Option<Mutation> {
        let path = self.tool_input.file_path.as_deref().filter(|p| !p.is_empty())?;
        let input = &self.tool_input;
        let change = match (&input.content, &input.old_string, &input.new_string) {
            (Some(content), _, _) => Change::Rewrite(content.clone()),
            (None, Some(old), Some(new)) => Change::Splice {
                old: old.clone(),
                new: new.clone(),
            },
            _ => return None,
        };
        Some(Mutation {
            path: PathBuf::from(path),
            change,
        })
    }

    /// The notification kind, for notification events.
    pub fn notification_kind(&self) -> NotificationKind {
        NotificationKind::parse(self.notification_type.as_deref())
    }
}

/// Session-state announcement categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The agent is idle and waiting for input.
    Idle,
    /// The agent needs permission to use a tool.
    PermissionRequest,
    /// The session is stopping.
    Stop,
    /// Anything else.
    Other,
}

impl NotificationKind {
    /// Map the raw notification type string to a kind.
    ///
    /// Matching is substring-based because agents vary in the exact labels
    /// they emit ("idle", "agent_idle", "permission_request", ...).
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Other;
        };
        let lowered = raw.to_ascii_lowercase();
        if lowered.contains("idle") {
            Self::Idle
        } else if lowered.contains("permission") {
            Self::PermissionRequest
        } else if lowered.contains("stop") {
            Self::Stop
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PermissionRequest => write!(f, "permission request"),
            Self::Stop => write!(f, "stop"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_write_event() {
        let json = r#"{
            "tool_name": "Write",
            "tool_input": {
                "file_path": "src/app.py",
                "content": "print('hi')\n"
            },
            "session_id": "abc123"
        }"#;

        let event = HookEvent::from_json(json).unwrap();
        assert_eq!(event.tool_name.as_deref(), Some("Write"));
        assert!(event.is_mutation_tool());

        let mutation = event.mutation().unwrap();
        assert_eq!(mutation.path, PathBuf::from("src/app.py"));
        assert_eq!(mutation.change, Change::Rewrite("print('hi')\n".to_string()));
    }

    #[test]
    fn test_parse_edit_event() {
        let json = r#"{
            "tool_name": "Edit",
            "tool_input": {
                "file_path": "src/app.py",
                "old_string": "a = 1",
                "new_string": "a = 2"
            }
        }"#;

        let event = HookEvent::from_json(json).unwrap();
        let mutation = event.mutation().unwrap();
        assert_eq!(
            mutation.change,
            Change::Splice {
                old: "a = 1".to_string(),
                new: "a = 2".to_string(),
            }
        );
    }

    #[test]
    fn test_mutation_requires_file_path() {
        let json = r#"{"tool_name": "Write", "tool_input": {"content": "x"}}"#;
        let event = HookEvent::from_json(json).unwrap();
        assert!(event.mutation().is_none());

        let json = r#"{"tool_name": "Write", "tool_input": {"file_path": "", "content": "x"}}"#;
        let event = HookEvent::from_json(json).unwrap();
        assert!(event.mutation().is_none());
    }

    #[test]
    fn test_mutation_requires_a_change_form() {
        let json = r#"{"tool_name": "Edit", "tool_input": {"file_path": "a.py"}}"#;
        let event = HookEvent::from_json(json).unwrap();
        assert!(event.mutation().is_none());

        // old_string without new_string is not a usable splice.
        let json = r#"{"tool_name": "Edit", "tool_input": {"file_path": "a.py", "old_string": "x"}}"#;
        let event = HookEvent::from_json(json).unwrap();
        assert!(event.mutation().is_none());
    }

    #[test]
    fn test_content_wins_when_both_forms_present() {
        let json = r#"{
            "tool_name": "Write",
            "tool_input": {
                "file_path": "a.py",
                "content": "whole",
                "old_string": "x",
                "new_string": "y"
            }
        }"#;
        let event = HookEvent::from_json(json).unwrap();
        assert_eq!(
            event.mutation().unwrap().change,
            Change::Rewrite("whole".to_string())
        );
    }

    #[test]
    fn test_parse_minimal_event() {
        let event = HookEvent::from_json("{}").unwrap();
        assert!(event.tool_name.is_none());
        assert!(!event.is_mutation_tool());
        assert!(event.mutation().is_none());
        assert_eq!(event.notification_kind(), NotificationKind::Other);
    }

    #[test]
    fn test_non_mutation_tool() {
        let json = r#"{"tool_name": "Read", "tool_input": {"file_path": "a.py"}}"#;
        let event = HookEvent::from_json(json).unwrap();
        assert!(!event.is_mutation_tool());
    }

    #[test]
    fn test_notification_kind_parse() {
        assert_eq!(NotificationKind::parse(Some("idle")), NotificationKind::Idle);
        assert_eq!(
            NotificationKind::parse(Some("agent_idle")),
            NotificationKind::Idle
        );
        assert_eq!(
            NotificationKind::parse(Some("permission_request")),
            NotificationKind::PermissionRequest
        );
        assert_eq!(NotificationKind::parse(Some("stop")), NotificationKind::Stop);
        assert_eq!(
            NotificationKind::parse(Some("something")),
            NotificationKind::Other
        );
        assert_eq!(NotificationKind::parse(None), NotificationKind::Other);
    }

    #[test]
    fn test_parse_unicode_content() {
        let json = r#"{
            "tool_name": "Write",
            "tool_input": {
                "file_path": "emoji.py",
                "content": "print('日本語 🦀')\n"
            }
        }"#;
        let event = HookEvent::from_json(json).unwrap();
        let Change::Rewrite(content) = event.mutation().unwrap().change else {
            panic!("expected rewrite");
        };
        assert!(content.contains("🦀"));
    }
}
