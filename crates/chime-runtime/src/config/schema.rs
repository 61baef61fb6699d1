//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chime_framework::{Operators, PrefixDefaults, PrefixResult};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChimeConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Process-wide default prefixes.
    #[serde(default)]
    pub prefixes: PrefixConfig,

    /// People allowed to run Admin commands.
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,

    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl ChimeConfig {
    /// Builds the operator list.
    pub fn operators(&self) -> Operators {
        self.operators
            .iter()
            .map(|op| (op.frontend.as_str(), op.id.as_str()))
            .collect()
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the lowercase name used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Writes to `logging.file_path`.
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module levels, e.g. `chime_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Prefixes & Operators
// =============================================================================

/// Process-wide default prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixConfig {
    #[serde(default = "default_normal")]
    pub normal: Vec<String>,

    #[serde(default = "default_advanced")]
    pub advanced: Vec<String>,

    /// Never changeable per place.
    #[serde(default = "default_admin")]
    pub admin: Vec<String>,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            normal: default_normal(),
            advanced: default_advanced(),
            admin: default_admin(),
        }
    }
}

impl PrefixConfig {
    /// Validates the lists and turns them into registry defaults.
    pub fn to_defaults(&self) -> PrefixResult<PrefixDefaults> {
        PrefixDefaults::new(
            self.normal.clone(),
            self.advanced.clone(),
            self.admin.clone(),
        )
    }
}

fn default_normal() -> Vec<String> {
    vec!["!".to_string()]
}

fn default_advanced() -> Vec<String> {
    vec!["$".to_string()]
}

fn default_admin() -> Vec<String> {
    vec!["##".to_string()]
}

/// An operator, identified by frontend name and native user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub frontend: String,
    pub id: String,
}

// =============================================================================
// Storage
// =============================================================================

/// Storage engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Everything is lost on exit.
    Memory,
}

/// Scope cache tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    #[default]
    Memory,
    None,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default)]
    pub cache: CacheMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
            cache: CacheMode::default(),
        }
    }
}

fn default_db_path() -> String {
    "chime.db".to_string()
}

// =============================================================================
// Pipeline
// =============================================================================

/// Pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for a single command action. `0` disables it.
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,

    /// Capacity of each event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            action_timeout_secs: default_action_timeout_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl PipelineConfig {
    /// Returns the action deadline, if enabled.
    pub fn action_timeout(&self) -> Option<Duration> {
        (self.action_timeout_secs > 0).then(|| Duration::from_secs(self.action_timeout_secs))
    }
}

fn default_action_timeout_secs() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    64
}
