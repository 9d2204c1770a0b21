//! Canonical event sequence used across harnesses.
//!
//! [`FIXTURE`] is a fourteen-event session mixing every built-in severity,
//! extras of several types and one exception. [`emit_fixture`] pushes it
//! through a router with deterministic, one-second-apart timestamps.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use runlog::{LogEvent, Router, Severity};
use serde_json::{json, Value};

pub struct FixtureEvent {
    pub severity: Severity,
    pub message: &'static str,
    pub extras: fn() -> Value,
    pub exception: Option<&'static str>,
}

const fn event(severity: Severity, message: &'static str, extras: fn() -> Value) -> FixtureEvent {
    FixtureEvent {
        severity,
        message,
        extras,
        exception: None,
    }
}

fn none() -> Value {
    json!({})
}

pub static FIXTURE: [FixtureEvent; 14] = [
    event(Severity::DEBUG, "Something is happening behind the scenes...", || json!({"debug_num": 1})),
    event(Severity::INFO, "This message contains some extra information", || json!({"var_1": true, "var_2": "ERROR"})),
    event(Severity::WARNING, "Something might be going wrong...", || json!({"warning_code": 1234})),
    event(Severity::DEBUG, "This is a second debug message", || json!({"debug_num": 2})),
    event(Severity::PERFORMANCE, "FUNCTION PERFORMANCE", none),
    event(Severity::WARNING, "Oopsy daisy! don't do that again :(", none),
    event(Severity::INFO, "Another piece of useful information about what is going on", none),
    event(Severity::ERROR, "ERROR skjdbvwibuyfi8whf209[3r8h9weuvb]", none),
    event(Severity::DEBUG, "Yet another debug message for testing", || json!({"debug_num": 3})),
    event(Severity::PERFORMANCE, "FAST PERFORMANCE, WANNA SEE ME DO IT AGAIN?", none),
    FixtureEvent {
        severity: Severity::ERROR,
        message: "Failed tricky thingy!",
        extras: || json!({"func_status": "FAIL"}),
        exception: Some("Traceback (most recent call last):\n  File \"fixtures.rs\", line 1\nZeroDivisionError: division by zero"),
    },
    event(Severity::DEBUG, "I think maybe everything is okay now...", || json!({"debug_num": 4})),
    event(Severity::PERFORMANCE, "FINALY FUNCTION PERFORMANCE", none),
    event(Severity::CRITICAL, "SHUTTING DOWN BEEP BOOP", none),
];

pub fn fixture_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

/// The `i`-th fixture event as a `LogEvent` from `router`.
pub fn fixture_event(router: &Router, i: usize) -> LogEvent {
    let entry = &FIXTURE[i];
    let mut event = router
        .event(entry.severity.clone(), entry.message)
        .timestamp(fixture_start() + Duration::seconds(i as i64))
        .at("json_log_harness", "emit_fixture", 100 + i as u32);
    if let Value::Object(extras) = (entry.extras)() {
        event = event.extras(extras);
    }
    if let Some(exception) = entry.exception {
        event = event.exception(exception);
    }
    event
}

/// Emit all of [`FIXTURE`] through `router`.
pub fn emit_fixture(router: &Router) {
    for i in 0..FIXTURE.len() {
        router.emit(&fixture_event(router, i)).expect("emit fixture event");
    }
}
