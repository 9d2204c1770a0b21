//! Configuration types for runlog.
//!
//! [`Config::from_file`] layers a user TOML file over the built-in defaults.
//! [`Config::defaults`] returns the same defaults without touching the
//! filesystem (useful in tests).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::format::FormatTemplate;
use crate::types::Severity;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[layout]
root = "data/logs"

[console]
enabled      = true
min_severity = "INFO"
template     = "basic"
stream       = "stderr"

[text_file]
min_severity = "DEBUG"
template     = "basic"

[json_file]
min_severity = "DEBUG"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level runlog configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub text_file: TextFileConfig,
    #[serde(default)]
    pub json_file: JsonFileConfig,
}

/// `[layout]` section: where run directories are created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf { PathBuf::from("data/logs") }

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { root: default_root() }
    }
}

/// Which standard stream the console sink writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    #[default]
    Stderr,
    Stdout,
}

/// `[console]` section: the default console sink.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,
    #[serde(default = "default_console_severity")]
    pub min_severity: Severity,
    #[serde(default)]
    pub template: FormatTemplate,
    #[serde(default)]
    pub stream: ConsoleStream,
}

fn default_console_enabled() -> bool { true }
fn default_console_severity() -> Severity { Severity::INFO }

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
            min_severity: default_console_severity(),
            template: FormatTemplate::default(),
            stream: ConsoleStream::default(),
        }
    }
}

/// `[text_file]` section: defaults for per-name readable log files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextFileConfig {
    #[serde(default = "default_file_severity")]
    pub min_severity: Severity,
    #[serde(default)]
    pub template: FormatTemplate,
}

fn default_file_severity() -> Severity { Severity::DEBUG }

impl Default for TextFileConfig {
    fn default() -> Self {
        Self {
            min_severity: default_file_severity(),
            template: FormatTemplate::default(),
        }
    }
}

/// `[json_file]` section: the shared JSON run log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonFileConfig {
    #[serde(default = "default_file_severity")]
    pub min_severity: Severity,
}

impl Default for JsonFileConfig {
    fn default() -> Self {
        Self { min_severity: default_file_severity() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            console: ConsoleConfig::default(),
            text_file: TextFileConfig::default(),
            json_file: JsonFileConfig::default(),
        }
    }
}

impl Config {
    /// Load `path` layered on top of the built-in defaults. A missing file
    /// leaves the defaults in place.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_ref()).required(false))
            .build()?
            .try_deserialize()
    }

    /// Return the built-in defaults without touching the filesystem. These
    /// match `DEFAULT_CONFIG` field for field.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Defaults with the run directory root replaced.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut cfg = Self::defaults();
        cfg.layout.root = root.into();
        cfg
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
