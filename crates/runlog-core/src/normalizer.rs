//! Normalizer: turns one persisted JSON line into a canonical [`LogRecord`].
//!
//! `timestamp` is the only required field. Every other canonical field falls
//! back to an empty value so queries never have to deal with absent keys.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::{Extras, LogRecord, RecordId};

/// Keys that may carry the caller's extras mapping. The JSON sink writes
/// `extra`; `extras` is accepted as well and `extra` wins on conflicts.
const EXTRAS_KEYS: [&str; 2] = ["extras", "extra"];

/// Parse and normalize one line of a JSON run log.
pub fn parse_line(line: &str, id: RecordId) -> Result<LogRecord, ParseError> {
    let raw: Value = serde_json::from_str(line)?;
    normalize(&raw, id)
}

/// Like [`parse_line`] for raw bytes read from disk. Bytes that are not
/// UTF-8 fail with [`ParseError::InvalidUtf8`] instead of being replaced.
pub fn parse_bytes(line: &[u8], id: RecordId) -> Result<LogRecord, ParseError> {
    parse_line(std::str::from_utf8(line)?, id)
}

/// Normalize an already-decoded JSON value.
pub fn normalize(raw: &Value, id: RecordId) -> Result<LogRecord, ParseError> {
    let obj = raw.as_object().ok_or(ParseError::NotAnObject)?;

    Ok(LogRecord {
        id,
        timestamp: timestamp_field(obj)?,
        level: text_field(obj, "level"),
        logger: text_field(obj, "logger"),
        message: text_field(obj, "message"),
        module: text_field(obj, "module"),
        function: text_field(obj, "function"),
        line: line_field(obj),
        exception: text_field(obj, "exception"),
        extras: extras_field(obj),
    })
}

/// Parse an ISO-8601 timestamp. RFC 3339 strings (with `Z` or an offset) are
/// accepted directly; a naive date-time is accepted only with a `Z` suffix.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    text.strip_suffix('Z')
        .and_then(|naive| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ParseError::InvalidTimestamp(text.to_string()))
}

fn timestamp_field(obj: &Map<String, Value>) -> Result<DateTime<Utc>, ParseError> {
    match obj.get("timestamp") {
        None | Some(Value::Null) => Err(ParseError::MissingTimestamp),
        Some(Value::String(text)) => parse_timestamp(text),
        Some(other) => Err(ParseError::InvalidTimestamp(other.to_string())),
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn line_field(obj: &Map<String, Value>) -> Option<u64> {
    match obj.get("line")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn extras_field(obj: &Map<String, Value>) -> Extras {
    let mut extras = Extras::new();
    for key in EXTRAS_KEYS {
        if let Some(Value::Object(map)) = obj.get(key) {
            extras.extend(map.clone());
        }
    }
    extras
}
