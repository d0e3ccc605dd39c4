//! Configuration for AHG.
//!
//! A per-project `.ahg.toml` overrides the built-in policy: line limits,
//! whole policy entries, tool command mappings, skip-list additions, stop
//! tokens, and the announcer chain. Discovery walks up from the working
//! directory; absence is not an error, and a broken file degrades to the
//! defaults with a warning so a config typo never deadlocks the agent.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::policy::{LanguageFamily, PolicyEntry, PolicyTable, SkipRules};

/// Project-local configuration file name.
pub const CONFIG_FILE_NAME: &str = ".ahg.toml";

/// Errors from loading a configuration file that does exist.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// Extension → line limit overrides.
    #[serde(default)]
    pub limits: HashMap<String, usize>,
    /// Extension → full policy entry override or addition.
    #[serde(default)]
    pub policy: HashMap<String, PolicyOverride>,
    /// Tool identifier → command mapping overrides or additions.
    #[serde(default)]
    pub tools: HashMap<String, ToolSpec>,
    #[serde(default)]
    pub skip: SkipConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub stop: StopConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Master switch; disabled means every hook allows immediately.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Timeout applied to every external tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

/// Partial policy entry from the config file; unset fields keep the built-in
/// value when overriding an existing extension.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyOverride {
    #[serde(default)]
    pub line_limit: Option<usize>,
    #[serde(default)]
    pub formatter: Option<String>,
    #[serde(default)]
    pub linter: Option<String>,
    #[serde(default)]
    pub test_runner: Option<String>,
    #[serde(default)]
    pub test_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub family: Option<LanguageFamily>,
}

/// How a tool identifier resolves to a command line.
///
/// `{file}` in any argument is replaced with the target path; when no
/// argument carries the placeholder the path is appended.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Concrete argument vector for a target file.
    pub fn args_for(&self, file: &Path) -> Vec<String> {
        let file = file.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains("{file}") {
                    substituted = true;
                    arg.replace("{file}", &file)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(file.into_owned());
        }
        args
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkipConfig {
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// When set, files currently over their line limit bypass format, lint,
    /// and test stages (relevant to edits accepted via the shrink exemption).
    #[serde(default)]
    pub skip_oversized: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    /// Literal markers that must not survive to session end.
    #[serde(default = "default_forbidden_tokens")]
    pub forbidden_tokens: Vec<String>,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            forbidden_tokens: default_forbidden_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Announce session starts through the router as well.
    #[serde(default)]
    pub announce_session_start: bool,
    /// Ordered announcer chain; first success wins.
    #[serde(default = "default_announcers")]
    pub announcers: Vec<AnnouncerConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            announce_session_start: false,
            announcers: default_announcers(),
        }
    }
}

/// One announcer backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnouncerConfig {
    /// Run a program with `{message}` substituted into its args.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// POST `{"text": message}` to a URL.
    Webhook { url: String },
    /// Tracing only; always succeeds.
    Log,
}

fn default_true() -> bool {
    true
}

fn default_tool_timeout() -> u64 {
    120
}

fn default_forbidden_tokens() -> Vec<String> {
    vec![
        "DO NOT SUBMIT".to_string(),
        "FIXME".to_string(),
        "XXX".to_string(),
    ]
}

fn default_announcers() -> Vec<AnnouncerConfig> {
    vec![AnnouncerConfig::Log]
}

/// Built-in tool identifier → command mappings.
fn builtin_tools() -> HashMap<String, ToolSpec> {
    let mut tools = HashMap::new();
    tools.insert("ruff-format".into(), ToolSpec::new("ruff", &["format", "{file}"]));
    tools.insert("ruff-check".into(), ToolSpec::new("ruff", &["check", "{file}"]));
    tools.insert("pytest".into(), ToolSpec::new("pytest", &["-q", "{file}"]));
    tools.insert("prettier".into(), ToolSpec::new("prettier", &["--write", "{file}"]));
    tools.insert("eslint".into(), ToolSpec::new("eslint", &["{file}"]));
    tools.insert("vitest".into(), ToolSpec::new("vitest", &["run", "{file}"]));
    tools.insert("shfmt".into(), ToolSpec::new("shfmt", &["-w", "{file}"]));
    tools.insert("shellcheck".into(), ToolSpec::new("shellcheck", &["{file}"]));
    tools.insert("bats".into(), ToolSpec::new("bats", &["{file}"]));
    tools.insert("gofmt".into(), ToolSpec::new("gofmt", &["-w", "{file}"]));
    tools.insert("govet".into(), ToolSpec::new("go", &["vet", "{file}"]));
    tools.insert(
        "rustfmt".into(),
        ToolSpec::new("rustfmt", &["--edition", "2024", "{file}"]),
    );
    tools
}

impl GuardConfig {
    /// Find the nearest config file, walking up from `start`.
    ///
    /// When `stop_at` is given (the working-tree root), the walk does not
    /// climb past it; otherwise it climbs to the filesystem root.
    pub fn discover(start: &Path, stop_at: Option<&Path>) -> Option<PathBuf> {
        let mut dir = start;
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if stop_at.is_some_and(|root| dir == root) {
                return None;
            }
            dir = dir.parent()?;
        }
    }

    /// Load a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Discover and load, degrading to defaults on any failure.
    pub fn load_or_default(start: &Path, stop_at: Option<&Path>) -> Self {
        match Self::discover(start, stop_at) {
            Some(path) => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("{e}; using defaults");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Resolve a tool identifier: project mapping first, then builtins.
    pub fn tool(&self, id: &str) -> Option<ToolSpec> {
        if let Some(spec) = self.tools.get(id) {
            return Some(spec.clone());
        }
        builtin_tools().remove(id)
    }

    /// Materialize the policy table with this config's overrides applied.
    pub fn policy_table(&self) -> PolicyTable {
        let mut table = PolicyTable::builtin();
        for (ext, limit) in &self.limits {
            table.set_line_limit(ext, *limit);
        }
        for (ext, over) in &self.policy {
            let base = table.lookup(ext).cloned().unwrap_or(PolicyEntry {
                line_limit: over.line_limit.unwrap_or(400),
                formatter: None,
                linter: None,
                test_runner: None,
                test_patterns: Vec::new(),
                family: LanguageFamily::Other,
            });
            table.insert(
                ext.clone(),
                PolicyEntry {
                    line_limit: over.line_limit.unwrap_or(base.line_limit),
                    formatter: over.formatter.clone().or(base.formatter),
                    linter: over.linter.clone().or(base.linter),
                    test_runner: over.test_runner.clone().or(base.test_runner),
                    test_patterns: over.test_patterns.clone().unwrap_or(base.test_patterns),
                    family: over.family.unwrap_or(base.family),
                },
            );
        }
        table
    }

    /// Materialize the skip rules with this config's additions applied.
    pub fn skip_rules(&self) -> SkipRules {
        let mut rules = SkipRules::builtin();
        rules.extend(
            self.skip.dirs.clone(),
            self.skip.files.clone(),
            self.skip.extensions.clone(),
        );
        rules
    }

    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.general.tool_timeout_secs)
    }
}
