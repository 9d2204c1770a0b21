//! runlog-sinks: run directory layout, sinks and the sink registry.
//!
//! A [`SinkRegistry`] hands out one live [`Sink`] per logical name. All
//! names share the run directory laid out by [`RunContext`] and the run's
//! JSON sink, which [`runlog_core::LogStore`] reads back for queries.

pub mod layout;
pub mod registry;
pub mod route;
pub mod sink;

pub use layout::RunContext;
pub use registry::{
    RegistryError, RouteOptions, SinkConfig, SinkRegistry, CONSOLE_SINK, JSON_SINK,
};
pub use route::{EmitError, Router};
pub use sink::{ConsoleSink, FileSink, Sink, SinkError, SinkHandle, SinkKind};
