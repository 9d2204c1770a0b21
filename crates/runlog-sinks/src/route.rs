//! Router: fans one event out to a fixed set of sinks.

use runlog_core::{LogEvent, Severity};

use crate::sink::{SinkError, SinkHandle};

/// Sinks that rejected an event during [`Router::emit`].
#[derive(Debug, thiserror::Error)]
#[error("{} sink(s) failed: {}", .failures.len(), summarize(.failures))]
pub struct EmitError {
    pub failures: Vec<(String, SinkError)>,
}

fn summarize(failures: &[(String, SinkError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The sinks one logical logger writes to, as handed out by
/// [`SinkRegistry::configure`](crate::SinkRegistry::configure).
#[derive(Debug, Clone)]
pub struct Router {
    name: String,
    sinks: Vec<SinkHandle>,
}

impl Router {
    pub fn new(name: &str, sinks: Vec<SinkHandle>) -> Self {
        Self {
            name: name.to_string(),
            sinks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sinks(&self) -> &[SinkHandle] {
        &self.sinks
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Start an event attributed to this router's logger name.
    pub fn event(&self, severity: Severity, message: impl Into<String>) -> LogEvent {
        LogEvent::new(severity, self.name.as_str(), message)
    }

    /// Write `event` to every sink. A failing sink does not stop the others;
    /// all failures are reported together afterwards.
    pub fn emit(&self, event: &LogEvent) -> Result<(), EmitError> {
        let failures: Vec<(String, SinkError)> = self
            .sinks
            .iter()
            .filter_map(|sink| {
                sink.write(event)
                    .err()
                    .map(|err| (sink.name().to_string(), err))
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(router = %self.name, failed = failures.len(), "event not persisted by every sink");
            Err(EmitError { failures })
        }
    }
}
