//! Normalizer integration harness.
//!
//! # What this covers
//!
//! - **Timestamps**: RFC 3339 with `Z` or an offset, fractional seconds of any
//!   precision, and naive date-times with a trailing `Z`. Anything else is an
//!   error, as is a missing or non-string timestamp.
//! - **Canonical fields**: absent or null text fields become `""`, non-string
//!   values are rendered as JSON text, `line` accepts numbers and numeric
//!   strings.
//! - **Extras**: read from `extra` or `extras`; non-object values ignored.
//! - **Parameterised over corpora**: rstest runs the per-line checks over a
//!   corpus written by the JSON sink and a hand-written corpus with the
//!   oddities other writers produce.
//! - **Fuzz**: proptest feeds arbitrary strings to `parse_line`, which must
//!   return an error rather than panic.
//!
//! # Running
//!
//! ```sh
//! cargo test --test normalization_harness
//! ```

mod common;
use common::*;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use runlog::normalizer::{normalize, parse_line, parse_timestamp};
use runlog::ParseError;
use serde_json::json;

// ---------------------------------------------------------------------------
// Corpora
// ---------------------------------------------------------------------------

/// Lines exactly as the JSON sink writes them.
fn sink_corpus() -> Vec<String> {
    let (_root, registry, router) = quiet_router("corpus");
    emit_fixture(&router);
    let path = registry.json_log_path().unwrap();
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Hand-written lines with offsets, missing fields and the `extras` key.
fn odd_corpus() -> Vec<String> {
    [
        json!({"timestamp": "2024-01-15T11:00:00+01:00", "level": "INFO", "message": "offset"}),
        json!({"timestamp": "2024-01-15T10:00:00.123Z", "level": "WARN", "extras": {"k": "v"}}),
        json!({"timestamp": "2024-01-15T10:00:00.5Z"}),
        json!({"timestamp": "2024-01-15T10:00:00Z", "line": "17", "message": 42}),
        json!({"timestamp": "2024-01-15T10:00:00Z", "level": null, "extra": [1, 2]}),
    ]
    .iter()
    .map(|v| v.to_string())
    .collect()
}

#[rstest]
#[case::sink(sink_corpus())]
#[case::odd(odd_corpus())]
fn every_corpus_line_normalizes(#[case] corpus: Vec<String>) {
    assert!(!corpus.is_empty());
    for (id, line) in corpus.iter().enumerate() {
        let record = parse_line(line, id).unwrap_or_else(|err| panic!("line {id}: {err}\n{line}"));
        assert_eq!(record.id, id);
    }
}

#[test]
fn sink_corpus_keeps_every_field() {
    let corpus = sink_corpus();
    let record = parse_line(&corpus[10], 10).unwrap();

    assert_eq!(record.level, "ERROR");
    assert_eq!(record.logger, "corpus");
    assert_eq!(record.message, "Failed tricky thingy!");
    assert_eq!(record.module, "json_log_harness");
    assert_eq!(record.function, "emit_fixture");
    assert_eq!(record.line, Some(110));
    assert_eq!(record.timestamp, fixture_start() + chrono::Duration::seconds(10));
    assert_eq!(record.extra("func_status"), Some(&json!("FAIL")));
    assert!(record.exception.contains("ZeroDivisionError"));
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

#[rstest]
#[case::zulu("2024-01-15T10:00:00Z", 0)]
#[case::micros("2024-01-15T10:00:00.500000Z", 500_000)]
#[case::millis("2024-01-15T10:00:00.250Z", 250_000)]
#[case::offset("2024-01-15T12:00:00+02:00", 0)]
#[case::negative_offset("2024-01-15T05:00:00-05:00", 0)]
fn accepted_timestamps(#[case] text: &str, #[case] micros: u32) {
    let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        + chrono::Duration::microseconds(micros as i64);
    assert_eq!(parse_timestamp(text).unwrap(), expected);
}

#[rstest]
#[case::naive_without_zone("2024-01-15T10:00:00")]
#[case::date_only("2024-01-15")]
#[case::space_separated("2024-01-15 10:00:00 UTC")]
#[case::garbage("yesterday")]
#[case::empty("")]
fn rejected_timestamps(#[case] text: &str) {
    assert!(matches!(parse_timestamp(text), Err(ParseError::InvalidTimestamp(_))));
}

#[rstest]
#[case::missing(json!({"level": "INFO"}))]
#[case::null(json!({"timestamp": null}))]
fn missing_timestamp(#[case] raw: serde_json::Value) {
    assert!(matches!(normalize(&raw, 0), Err(ParseError::MissingTimestamp)));
}

#[test]
fn numeric_timestamp_is_invalid() {
    let raw = json!({"timestamp": 1705312800});
    assert!(matches!(normalize(&raw, 0), Err(ParseError::InvalidTimestamp(_))));
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[test]
fn non_string_fields_become_json_text() {
    let raw = json!({
        "timestamp": "2024-01-15T10:00:00Z",
        "message": 42,
        "logger": {"name": "x"},
        "level": true,
        "module": null
    });
    let record = normalize(&raw, 0).unwrap();

    assert_eq!(record.message, "42");
    assert_eq!(record.logger, r#"{"name":"x"}"#);
    assert_eq!(record.level, "true");
    assert_eq!(record.module, "");
}

#[rstest]
#[case::number(json!(17), Some(17))]
#[case::numeric_string(json!("17"), Some(17))]
#[case::padded_string(json!(" 17 "), Some(17))]
#[case::word(json!("seventeen"), None)]
#[case::negative(json!(-1), None)]
#[case::null(json!(null), None)]
fn line_field(#[case] line: serde_json::Value, #[case] expected: Option<u64>) {
    let raw = json!({"timestamp": "2024-01-15T10:00:00Z", "line": line});
    assert_eq!(normalize(&raw, 0).unwrap().line, expected);
}

#[test]
fn extras_from_either_key() {
    let raw = json!({
        "timestamp": "2024-01-15T10:00:00Z",
        "extras": {"a": 1, "shared": "from extras"},
        "extra": {"b": 2, "shared": "from extra"}
    });
    let record = normalize(&raw, 0).unwrap();

    assert_eq!(record.extra("a"), Some(&json!(1)));
    assert_eq!(record.extra("b"), Some(&json!(2)));
    assert_eq!(record.extra("shared"), Some(&json!("from extra")));
}

#[rstest]
#[case::array(json!([1, 2]))]
#[case::string(json!("k=v"))]
#[case::null(json!(null))]
fn non_object_extras_are_ignored(#[case] extra: serde_json::Value) {
    let raw = json!({"timestamp": "2024-01-15T10:00:00Z", "extra": extra});
    assert!(normalize(&raw, 0).unwrap().extras.is_empty());
}

#[rstest]
#[case::array("[1, 2, 3]")]
#[case::string(r#""just a string""#)]
#[case::number("12")]
fn non_object_lines(#[case] line: &str) {
    assert!(matches!(parse_line(line, 0), Err(ParseError::NotAnObject)));
}

#[test]
fn truncated_line_is_invalid_json() {
    let line = r#"{"timestamp":"2024-01-15T10:00:00Z","level":"IN"#;
    assert!(matches!(parse_line(line, 0), Err(ParseError::InvalidJson(_))));
}

// ---------------------------------------------------------------------------
// Fuzz
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn arbitrary_text_never_panics(line in ".{0,200}") {
        let _ = parse_line(&line, 0);
    }

    #[test]
    fn any_message_survives(message in "\\PC{0,80}", id in 0usize..10_000) {
        let line = json!({"timestamp": "2024-01-15T10:00:00Z", "message": &message}).to_string();
        let record = parse_line(&line, id).unwrap();
        prop_assert_eq!(record.id, id);
        prop_assert_eq!(record.message, message);
    }
}
