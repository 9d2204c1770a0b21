//! Registry: one live sink per logical name, for the whole process.
//!
//! The first [`SinkRegistry::add`] stamps the run, creates its directory and
//! opens the shared JSON sink (plus the console sink when enabled). Every
//! later call reuses that run until [`SinkRegistry::reset`]. All map
//! mutations and the one-time run setup happen under a single mutex, so
//! racing first callers still produce exactly one run.
//!
//! ```text
//! Uninitialized ──add──► Initialized ──(add | get | remove)*──► reset ──► Uninitialized
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use runlog_core::{Config, FormatTemplate, Severity};

use crate::layout::RunContext;
use crate::route::Router;
use crate::sink::{ConsoleSink, FileSink, SinkError, SinkHandle, SinkKind};

/// Name of the shared JSON sink every router writes to.
pub const JSON_SINK: &str = "json";
/// Name of the default console sink.
pub const CONSOLE_SINK: &str = "console";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("sink `{0}` is already registered")]
    DuplicateName(String),

    #[error("no sink named `{0}` is registered")]
    NotFound(String),

    #[error("`{0}` names a default sink and cannot be routed")]
    ReservedName(String),

    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

fn io_failure(path: &Path) -> impl FnOnce(io::Error) -> RegistryError + '_ {
    move |source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Per-sink overrides for [`SinkRegistry::add`]. Unset fields fall back to
/// the registry's [`Config`].
#[derive(Debug, Clone, Default)]
pub struct SinkConfig {
    pub min_severity: Option<Severity>,
    pub template: Option<FormatTemplate>,
}

impl SinkConfig {
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    pub fn template(mut self, template: FormatTemplate) -> Self {
        self.template = Some(template);
        self
    }
}

/// Options for [`SinkRegistry::configure`].
#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Template for the name's text file when it has to be created.
    pub template: Option<FormatTemplate>,
    /// Include the console sink, if one is registered.
    pub to_console: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            template: None,
            to_console: true,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    run: Option<RunContext>,
    sinks: HashMap<String, SinkHandle>,
}

pub struct SinkRegistry {
    config: Config,
    state: Mutex<RegistryState>,
}

impl SinkRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// A registry with default settings rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(Config::with_root(root))
    }

    /// The process-wide registry, built from [`Config::defaults`] on first use.
    pub fn global() -> &'static SinkRegistry {
        static GLOBAL: OnceLock<SinkRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| SinkRegistry::new(Config::defaults()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Every critical section leaves the map consistent, so a poisoned lock
    // is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new sink named `name`.
    ///
    /// The first call of a run also sets up the run directory and the default
    /// sinks, so `add(JSON_SINK, ..)` always fails as a duplicate. A failure
    /// to open the requested sink leaves every existing sink in place.
    pub fn add(
        &self,
        name: &str,
        kind: SinkKind,
        config: SinkConfig,
    ) -> Result<SinkHandle, RegistryError> {
        let mut state = self.lock();
        let run = self.ensure_run(&mut state)?;

        if state.sinks.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        let sink = self.build_sink(&run, name, kind, &config)?;
        state.sinks.insert(name.to_string(), Arc::clone(&sink));
        tracing::debug!(sink = name, %kind, path = ?sink.path(), "registered sink");
        Ok(sink)
    }

    pub fn get(&self, name: &str) -> Result<SinkHandle, RegistryError> {
        self.lock()
            .sinks
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().sinks.contains_key(name)
    }

    /// Flush and close the sink, then drop it from the registry. The entry is
    /// removed even when closing fails; the close error is returned.
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        let sink = self
            .lock()
            .sinks
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        tracing::debug!(sink = name, "removing sink");
        sink.close()?;
        Ok(())
    }

    /// Close every sink and forget the current run. Safe on an empty registry.
    pub fn reset(&self) {
        let mut state = self.lock();
        for (name, sink) in state.sinks.drain() {
            if let Err(err) = sink.close() {
                tracing::warn!(sink = %name, error = %err, "failed to close sink during reset");
            }
        }
        if let Some(run) = state.run.take() {
            tracing::debug!(run_id = run.run_id(), "registry reset");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().run.is_some()
    }

    pub fn run_context(&self) -> Option<RunContext> {
        self.lock().run.clone()
    }

    /// Path of the shared JSON run log, once the run exists.
    pub fn json_log_path(&self) -> Option<PathBuf> {
        self.lock().run.as_ref().map(RunContext::json_log_path)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().sinks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Router for `run_name`: its text file (created on first use), the shared
    /// JSON sink and, when requested and registered, the console sink.
    ///
    /// The default sink names cannot be routed. Every lookup happens before
    /// the text sink is created, so a failure leaves the registry unchanged.
    pub fn configure(&self, run_name: &str, options: RouteOptions) -> Result<Router, RegistryError> {
        if run_name == JSON_SINK || run_name == CONSOLE_SINK {
            return Err(RegistryError::ReservedName(run_name.to_string()));
        }

        let mut state = self.lock();
        let run = self.ensure_run(&mut state)?;

        let json = state
            .sinks
            .get(JSON_SINK)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(JSON_SINK.to_string()))?;
        let console = options
            .to_console
            .then(|| state.sinks.get(CONSOLE_SINK).cloned())
            .flatten();

        let text = match state.sinks.get(run_name) {
            Some(existing) => Arc::clone(existing),
            None => {
                let config = SinkConfig {
                    template: options.template,
                    ..SinkConfig::default()
                };
                let sink = self.build_sink(&run, run_name, SinkKind::TextFile, &config)?;
                state.sinks.insert(run_name.to_string(), Arc::clone(&sink));
                tracing::debug!(sink = run_name, path = ?sink.path(), "registered sink");
                sink
            }
        };

        let mut sinks = vec![text, json];
        if let Some(console) = console {
            // `run_name` may itself have been added as a console sink
            if !Arc::ptr_eq(&sinks[0], &console) {
                sinks.push(console);
            }
        }

        Ok(Router::new(run_name, sinks))
    }

    /// Stamp the run and open the default sinks if this is the first use.
    /// Nothing is recorded unless every step succeeds.
    fn ensure_run(&self, state: &mut RegistryState) -> Result<RunContext, RegistryError> {
        if let Some(run) = &state.run {
            return Ok(run.clone());
        }

        let root = &self.config.layout.root;
        let run = RunContext::initialize(root).map_err(io_failure(root))?;

        let json_path = run.json_log_path();
        let json: SinkHandle = Arc::new(
            FileSink::json(JSON_SINK, &json_path, self.config.json_file.min_severity.clone())
                .map_err(io_failure(&json_path))?,
        );

        let console: Option<SinkHandle> = self.config.console.enabled.then(|| {
            Arc::new(ConsoleSink::new(
                CONSOLE_SINK,
                self.config.console.stream,
                self.config.console.template,
                self.config.console.min_severity.clone(),
            )) as SinkHandle
        });

        state.sinks.insert(JSON_SINK.to_string(), json);
        if let Some(console) = console {
            state.sinks.insert(CONSOLE_SINK.to_string(), console);
        }
        tracing::debug!(run_id = run.run_id(), dir = %run.run_directory().display(), "run initialized");
        state.run = Some(run.clone());
        Ok(run)
    }

    fn build_sink(
        &self,
        run: &RunContext,
        name: &str,
        kind: SinkKind,
        config: &SinkConfig,
    ) -> Result<SinkHandle, RegistryError> {
        let sink: SinkHandle = match kind {
            SinkKind::Console => {
                let console = &self.config.console;
                Arc::new(ConsoleSink::new(
                    name,
                    console.stream,
                    config.template.unwrap_or(console.template),
                    config
                        .min_severity
                        .clone()
                        .unwrap_or_else(|| console.min_severity.clone()),
                ))
            }
            SinkKind::TextFile => {
                let path = run.text_log_path(name);
                run.ensure_directory().map_err(io_failure(run.run_directory()))?;
                let text = &self.config.text_file;
                Arc::new(
                    FileSink::text(
                        name,
                        &path,
                        config.template.unwrap_or(text.template),
                        config
                            .min_severity
                            .clone()
                            .unwrap_or_else(|| text.min_severity.clone()),
                    )
                    .map_err(io_failure(&path))?,
                )
            }
            SinkKind::JsonFile => {
                let path = run.named_json_log_path(name);
                run.ensure_directory().map_err(io_failure(run.run_directory()))?;
                Arc::new(
                    FileSink::json(
                        name,
                        &path,
                        config
                            .min_severity
                            .clone()
                            .unwrap_or_else(|| self.config.json_file.min_severity.clone()),
                    )
                    .map_err(io_failure(&path))?,
                )
            }
        };
        Ok(sink)
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SinkRegistry")
            .field("root", &self.config.layout.root)
            .field("run", &state.run)
            .field("sinks", &state.sinks.len())
            .finish()
    }
}
