//! Core types for runlog-core.
//!
//! This module defines the data structures shared by the sinks and the query
//! engine: the ordered [`Severity`] scale, the [`LogEvent`] handed to sinks by
//! the emitting front-end, and the canonical [`LogRecord`] read back from a
//! JSON run log.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Position of a record within one load of a JSON run log (0-based, file order).
pub type RecordId = usize;

/// Arbitrary caller-supplied context attached to one event.
pub type Extras = Map<String, Value>;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Log severity on an open, ordered scale.
///
/// The built-in levels mirror the conventional numeric scale with
/// `PERFORMANCE` slotted between `DEBUG` and `INFO`. Projects may add their
/// own levels with [`Severity::custom`]; comparisons use the numeric value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Severity {
    value: u16,
    name: Cow<'static, str>,
}

static BUILTIN_SEVERITIES: phf::Map<&'static str, Severity> = phf::phf_map! {
    "DEBUG" => Severity::DEBUG,
    "PERFORMANCE" => Severity::PERFORMANCE,
    "INFO" => Severity::INFO,
    "WARNING" => Severity::WARNING,
    "WARN" => Severity::WARNING,
    "ERROR" => Severity::ERROR,
    "CRITICAL" => Severity::CRITICAL,
    "FATAL" => Severity::CRITICAL,
};

impl Severity {
    pub const DEBUG: Severity = Severity::builtin(10, "DEBUG");
    pub const PERFORMANCE: Severity = Severity::builtin(15, "PERFORMANCE");
    pub const INFO: Severity = Severity::builtin(20, "INFO");
    pub const WARNING: Severity = Severity::builtin(30, "WARNING");
    pub const ERROR: Severity = Severity::builtin(40, "ERROR");
    pub const CRITICAL: Severity = Severity::builtin(50, "CRITICAL");

    const fn builtin(value: u16, name: &'static str) -> Self {
        Self {
            value,
            name: Cow::Borrowed(name),
        }
    }

    /// A project-specific level. The name is stored upper-cased.
    pub fn custom(value: u16, name: impl Into<String>) -> Self {
        Self {
            value,
            name: Cow::Owned(name.into().to_ascii_uppercase()),
        }
    }

    /// Resolve a built-in level by name, ignoring case. `WARN` and `FATAL`
    /// are accepted as aliases of `WARNING` and `CRITICAL`.
    pub fn from_name(name: &str) -> Option<Severity> {
        BUILTIN_SEVERITIES
            .get(name.trim().to_ascii_uppercase().as_str())
            .cloned()
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when `self` is at least as severe as `threshold`.
    pub fn is_at_least(&self, threshold: &Severity) -> bool {
        self.value >= threshold.value
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Severity::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown severity `{name}`")))
    }
}

// ---------------------------------------------------------------------------
// LogEvent
// ---------------------------------------------------------------------------

/// One event as produced by the emitting front-end and consumed by sinks.
///
/// The front-end is responsible for rendering the message, locating the call
/// site and formatting any exception; sinks only persist what they are given.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Dotted logger name.
    pub logger: String,
    /// Fully rendered message text.
    pub message: String,
    pub module: String,
    pub function: String,
    pub line: u32,
    pub exception: Option<String>,
    pub extras: Extras,
}

impl LogEvent {
    /// A new event stamped with the current time and no call-site details.
    pub fn new(severity: Severity, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            logger: logger.into(),
            message: message.into(),
            module: String::new(),
            function: String::new(),
            line: 0,
            exception: None,
            extras: Extras::new(),
        }
    }

    pub fn at(mut self, module: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        self.module = module.into();
        self.function = function.into();
        self.line = line;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn exception(mut self, text: impl Into<String>) -> Self {
        self.exception = Some(text.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn extras(mut self, extras: Extras) -> Self {
        self.extras.extend(extras);
        self
    }

    /// Serialize into the single-line JSON run log schema (no trailing newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&WireEvent {
            timestamp: self
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            level: self.severity.name(),
            logger: &self.logger,
            message: &self.message,
            module: &self.module,
            function: &self.function,
            line: self.line,
            exception: self.exception.as_deref().unwrap_or(""),
            extra: &self.extras,
        })
    }
}

/// Field order here is the on-disk key order.
#[derive(Serialize)]
struct WireEvent<'a> {
    timestamp: String,
    level: &'a str,
    logger: &'a str,
    message: &'a str,
    module: &'a str,
    function: &'a str,
    line: u32,
    exception: &'a str,
    extra: &'a Extras,
}

// ---------------------------------------------------------------------------
// LogRecord
// ---------------------------------------------------------------------------

/// Canonical record read back from a JSON run log.
///
/// Every field except `id` and `timestamp` falls back to an empty value when
/// the persisted line omits it. `line` is `None` when absent or not numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub logger: String,
    pub message: String,
    pub module: String,
    pub function: String,
    pub line: Option<u64>,
    pub exception: String,
    pub extras: Extras,
}

impl LogRecord {
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// `extras[key]` if present, otherwise `default`.
    pub fn extra_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.extras
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// The built-in severity named by `level`, if it names one.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_name(&self.level)
    }
}
