//! Shared types and utilities for Agent Hook Guard.
//!
//! This crate carries everything the hook binary needs that is not
//! orchestration: the stdin event protocol, the extension policy table,
//! configuration loading, and the violation model that projects to the
//! exit-code contract.

pub mod config;
pub mod policy;
pub mod protocol;
pub mod util;
pub mod violation;

pub use config::{AnnouncerConfig, ConfigError, GuardConfig, ToolSpec, CONFIG_FILE_NAME};
pub use policy::{LanguageFamily, PolicyEntry, PolicyTable, SkipReason, SkipRules};
pub use protocol::{Change, HookEvent, Mutation, NotificationKind};
pub use violation::{Verdict, Violation, ViolationKind, EXIT_ALLOW, EXIT_BLOCK, EXIT_WARN};
