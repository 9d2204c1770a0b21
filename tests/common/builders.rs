//! Test builders: isolated registries and raw run-log lines.
//!
//! These are designed for readability in test assertions, not for production
//! use. They panic on setup failures rather than returning `Result`.

#![allow(dead_code)]

use runlog::{Config, LogStore, RouteOptions, Router, SinkRegistry};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Route the crates' `tracing` output through the test writer so it shows up
/// with `--nocapture`. Filter with `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    });
}

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// A registry rooted in its own temp dir with the console sink disabled, so
/// harness output stays quiet. Keep the `TempDir` alive for the test.
pub fn quiet_registry() -> (TempDir, SinkRegistry) {
    init_tracing();
    let root = tempfile::tempdir().expect("create temp log root");
    let mut config = Config::with_root(root.path());
    config.console.enabled = false;
    (root, SinkRegistry::new(config))
}

/// A quiet registry plus a router for `run_name`.
pub fn quiet_router(run_name: &str) -> (TempDir, SinkRegistry, Router) {
    let (root, registry) = quiet_registry();
    let router = registry
        .configure(run_name, RouteOptions::default())
        .expect("configure router");
    (root, registry, router)
}

/// Load the registry's shared JSON run log.
pub fn load_run_log(registry: &SinkRegistry) -> LogStore {
    let path = registry.json_log_path().expect("registry has a run");
    LogStore::open(&path).expect("load run log")
}

// ---------------------------------------------------------------------------
// Raw run-log files
// ---------------------------------------------------------------------------

/// Write `lines` verbatim (newline-terminated) to `<dir>/<name>`.
pub fn write_raw_log(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("create raw log");
    for line in lines {
        writeln!(file, "{line}").expect("write raw line");
    }
    path
}

/// Append `lines` to an existing file.
pub fn append_raw_lines(path: &Path, lines: &[String]) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .expect("open for append");
    for line in lines {
        writeln!(file, "{line}").expect("append raw line");
    }
}

/// A well-formed run-log line at `2024-01-15T10:00:<second>Z`.
pub fn raw_line(level: &str, message: &str, second: u32) -> String {
    serde_json::json!({
        "timestamp": format!("2024-01-15T10:{:02}:{:02}Z", second / 60, second % 60),
        "level": level,
        "logger": "raw",
        "message": message,
        "module": "builders",
        "function": "raw_line",
        "line": 1,
        "exception": "",
        "extra": {}
    })
    .to_string()
}
