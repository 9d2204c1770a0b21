//! runlog: per-run structured log sinks and a query layer over the run log.
//!
//! This crate re-exports the two workspace crates so that integration tests
//! and downstream users can depend on a single package.
//!
//! # Architecture
//!
//! ```text
//! emitter ──► SinkRegistry ──► Router ──► Console / TextFile / JSONFile sinks
//!                  │                                     │
//!              RunContext                       <run>.json.log
//!                                                        │
//!                                           normalizer ──► LogStore queries
//! ```
//!
//! # Example
//!
//! ```no_run
//! use runlog::{LogStore, RouteOptions, Severity, SinkRegistry};
//!
//! let registry = SinkRegistry::global();
//! let main = registry.configure("main", RouteOptions::default()).unwrap();
//! main.emit(&main.event(Severity::INFO, "started").extra("port", 8080)).unwrap();
//!
//! let mut store = LogStore::new();
//! store.load(registry.json_log_path().unwrap()).unwrap();
//! assert_eq!(store.level_counts()["INFO"], 1);
//! ```

pub use runlog_core::{
    config, error, format, normalizer, store, types, Config, Extras, FormatTemplate, LoadReport,
    LogEvent, LogRecord, LogStore, ParseError, QueryError, RecordId, RecordIds, Selection,
    Severity, Table,
};
pub use runlog_sinks::{
    layout, registry, route, sink, ConsoleSink, EmitError, FileSink, RegistryError, RouteOptions,
    Router, RunContext, Sink, SinkConfig, SinkError, SinkHandle, SinkKind, SinkRegistry,
    CONSOLE_SINK, JSON_SINK,
};
