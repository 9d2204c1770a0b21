//! Human-readable line templates for console and text-file sinks.
//!
//! A [`FormatTemplate`] names one of a closed set of line patterns. Patterns use
//! `{placeholder}` fields; [`render`] substitutes them from a [`LogEvent`].

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::types::LogEvent;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z]+)\}").expect("placeholder pattern must be a valid regex")
});

/// `2024-01-15 10:00:00,123`
const ASCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Named line layouts available to text sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTemplate {
    /// `{asctime} - {levelname} - {message}`
    #[default]
    Basic,
    /// `{asctime} - {name} - {levelname} - {message}`
    LoggerName,
    /// `{asctime} - [{name}][{levelname}]: {message}`
    LoggerNameBrackets,
    /// `{asctime} [{levelname}][{funcName}]: {message}`
    FuncName,
    /// `{asctime} [{levelname}][{module}][{funcName}]: {message}`
    ModuleFuncName,
}

impl FormatTemplate {
    pub const ALL: [FormatTemplate; 5] = [
        FormatTemplate::Basic,
        FormatTemplate::LoggerName,
        FormatTemplate::LoggerNameBrackets,
        FormatTemplate::FuncName,
        FormatTemplate::ModuleFuncName,
    ];

    pub fn pattern(self) -> &'static str {
        match self {
            FormatTemplate::Basic => "{asctime} - {levelname} - {message}",
            FormatTemplate::LoggerName => "{asctime} - {name} - {levelname} - {message}",
            FormatTemplate::LoggerNameBrackets => "{asctime} - [{name}][{levelname}]: {message}",
            FormatTemplate::FuncName => "{asctime} [{levelname}][{funcName}]: {message}",
            FormatTemplate::ModuleFuncName => {
                "{asctime} [{levelname}][{module}][{funcName}]: {message}"
            }
        }
    }
}

/// Render `event` with `template`. A non-empty exception text follows the
/// rendered line on its own line(s). Unknown placeholders are left verbatim.
pub fn render(template: FormatTemplate, event: &LogEvent) -> String {
    let mut line = PLACEHOLDER
        .replace_all(template.pattern(), |caps: &Captures| {
            placeholder_value(event, &caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();

    if let Some(exception) = event.exception.as_deref().filter(|e| !e.is_empty()) {
        line.push('\n');
        line.push_str(exception.trim_end_matches('\n'));
    }
    line
}

fn placeholder_value(event: &LogEvent, field: &str) -> Option<String> {
    let value = match field {
        "asctime" => event.timestamp.format(ASCTIME_FORMAT).to_string(),
        "levelname" => event.severity.name().to_string(),
        "name" => event.logger.clone(),
        "module" => event.module.clone(),
        "funcName" => event.function.clone(),
        "lineno" => event.line.to_string(),
        "message" => event.message.clone(),
        _ => return None,
    };
    Some(value)
}
