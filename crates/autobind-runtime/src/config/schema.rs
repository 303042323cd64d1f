//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use autobind_core::Stage;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```toml
/// [auto_config]
/// namespaces = ["my_app::health", "my_app::resources"]
///
/// [injector]
/// stage = "production"
/// bind_config_type = true
///
/// [logging]
/// level = "info"
/// format = "compact"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutobindConfig {
    /// Component discovery settings.
    #[serde(default)]
    pub auto_config: AutoConfigSection,

    /// Injector settings.
    #[serde(default)]
    pub injector: InjectorConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The `[auto_config]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AutoConfigSection {
    /// Module paths scanned for components. Empty disables discovery.
    #[serde(default)]
    pub namespaces: Vec<String>,
}

/// The `[injector]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InjectorConfig {
    /// When singletons are constructed.
    #[serde(default)]
    pub stage: Stage,

    /// Also bind the concrete configuration type, not only `dyn Configuration`.
    #[serde(default)]
    pub bind_config_type: bool,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
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
    /// Lowercase name, as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// The matching `tracing` level.
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

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires [`LoggingConfig::file_path`].
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
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

/// The `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Span events to log; request spans are emitted by the injector filter.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file, used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `autobind_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}
