//! Sinks: destinations that durably persist one [`LogEvent`] at a time.
//!
//! Each sink serializes its own writes behind its own mutex, so a line is
//! never interleaved with another write to the same sink, while separate
//! sinks never wait on each other. A closed sink rejects further writes with
//! an I/O error of kind [`io::ErrorKind::BrokenPipe`].

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use runlog_core::config::ConsoleStream;
use runlog_core::{format, FormatTemplate, LogEvent, Severity};

/// Shared reference to a registered sink.
pub type SinkHandle = Arc<dyn Sink>;

/// Which kind of destination a sink writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    TextFile,
    JsonFile,
}

impl SinkKind {
    /// Severity a sink of this kind accepts when not configured otherwise.
    pub fn default_min_severity(self) -> Severity {
        match self {
            SinkKind::Console => Severity::INFO,
            SinkKind::TextFile | SinkKind::JsonFile => Severity::DEBUG,
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Console => write!(f, "console"),
            SinkKind::TextFile => write!(f, "text-file"),
            SinkKind::JsonFile => write!(f, "json-file"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("i/o failure on sink `{sink}`: {source}")]
    Io {
        sink: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode event for sink `{sink}`: {source}")]
    Encode {
        sink: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SinkError {
    /// True when the write was rejected because the sink was already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, SinkError::Io { source, .. } if source.kind() == io::ErrorKind::BrokenPipe)
    }
}

/// A destination for log events.
pub trait Sink: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> SinkKind;

    /// Backing file, for file sinks.
    fn path(&self) -> Option<&Path> {
        None
    }

    fn min_severity(&self) -> &Severity;

    fn accepts(&self, event: &LogEvent) -> bool {
        event.severity.is_at_least(self.min_severity())
    }

    /// Persist `event` as one line. Events below the sink's minimum severity
    /// are dropped, but a closed sink still reports its closed state.
    fn write(&self, event: &LogEvent) -> Result<(), SinkError>;

    fn flush(&self) -> Result<(), SinkError>;

    /// Flush and release the underlying handle. Closing twice is a no-op.
    fn close(&self) -> Result<(), SinkError>;

    fn is_closed(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Line writer shared by every sink
// ---------------------------------------------------------------------------

/// A writer behind a mutex; `None` once closed.
struct LockedWriter<W: Write> {
    sink: String,
    out: Mutex<Option<W>>,
}

impl<W: Write> LockedWriter<W> {
    fn new(sink: &str, out: W) -> Self {
        Self {
            sink: sink.to_string(),
            out: Mutex::new(Some(out)),
        }
    }

    // A panic mid-write leaves at worst a partial line, which readers skip.
    fn lock(&self) -> MutexGuard<'_, Option<W>> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn io_err(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            sink: self.sink.clone(),
            source,
        }
    }

    fn closed(&self) -> SinkError {
        self.io_err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            format!("sink `{}` is closed", self.sink),
        ))
    }

    fn write_line(&self, mut line: String) -> Result<(), SinkError> {
        line.push('\n');
        let mut out = self.lock();
        let w = out.as_mut().ok_or_else(|| self.closed())?;
        w.write_all(line.as_bytes())
            .and_then(|()| w.flush())
            .map_err(|e| self.io_err(e))
    }

    fn ensure_open(&self) -> Result<(), SinkError> {
        match self.lock().as_ref() {
            Some(_) => Ok(()),
            None => Err(self.closed()),
        }
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut out = self.lock();
        let w = out.as_mut().ok_or_else(|| self.closed())?;
        w.flush().map_err(|e| self.io_err(e))
    }

    fn close(&self) -> Result<(), SinkError> {
        match self.lock().take() {
            Some(mut w) => w.flush().map_err(|e| self.io_err(e)),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.lock().is_none()
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Writes template-formatted lines to a standard stream (or any writer).
pub struct ConsoleSink {
    name: String,
    template: FormatTemplate,
    min_severity: Severity,
    out: LockedWriter<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(
        name: &str,
        stream: ConsoleStream,
        template: FormatTemplate,
        min_severity: Severity,
    ) -> Self {
        let out: Box<dyn Write + Send> = match stream {
            ConsoleStream::Stderr => Box::new(io::stderr()),
            ConsoleStream::Stdout => Box::new(io::stdout()),
        };
        Self::with_writer(name, out, template, min_severity)
    }

    /// A console sink over an arbitrary writer, e.g. an in-memory buffer.
    pub fn with_writer(
        name: &str,
        out: Box<dyn Write + Send>,
        template: FormatTemplate,
        min_severity: Severity,
    ) -> Self {
        Self {
            name: name.to_string(),
            template,
            min_severity,
            out: LockedWriter::new(name, out),
        }
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    fn min_severity(&self) -> &Severity {
        &self.min_severity
    }

    fn write(&self, event: &LogEvent) -> Result<(), SinkError> {
        if !self.accepts(event) {
            return self.out.ensure_open();
        }
        self.out.write_line(format::render(self.template, event))
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.out.flush()
    }

    fn close(&self) -> Result<(), SinkError> {
        self.out.close()
    }

    fn is_closed(&self) -> bool {
        self.out.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum LineEncoding {
    Text(FormatTemplate),
    Json,
}

/// Appends one line per event to a file; readable text or JSON.
pub struct FileSink {
    name: String,
    path: PathBuf,
    encoding: LineEncoding,
    min_severity: Severity,
    out: LockedWriter<BufWriter<File>>,
}

impl FileSink {
    /// Readable lines rendered with `template`.
    pub fn text(
        name: &str,
        path: impl Into<PathBuf>,
        template: FormatTemplate,
        min_severity: Severity,
    ) -> io::Result<Self> {
        Self::open(name, path.into(), LineEncoding::Text(template), min_severity)
    }

    /// One JSON object per line in the run log schema.
    pub fn json(name: &str, path: impl Into<PathBuf>, min_severity: Severity) -> io::Result<Self> {
        Self::open(name, path.into(), LineEncoding::Json, min_severity)
    }

    fn open(
        name: &str,
        path: PathBuf,
        encoding: LineEncoding,
        min_severity: Severity,
    ) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            name: name.to_string(),
            path,
            encoding,
            min_severity,
            out: LockedWriter::new(name, BufWriter::new(file)),
        })
    }

    fn encode(&self, event: &LogEvent) -> Result<String, SinkError> {
        match self.encoding {
            LineEncoding::Text(template) => Ok(format::render(template, event)),
            LineEncoding::Json => event.to_json_line().map_err(|source| SinkError::Encode {
                sink: self.name.clone(),
                source,
            }),
        }
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SinkKind {
        match self.encoding {
            LineEncoding::Text(_) => SinkKind::TextFile,
            LineEncoding::Json => SinkKind::JsonFile,
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn min_severity(&self) -> &Severity {
        &self.min_severity
    }

    fn write(&self, event: &LogEvent) -> Result<(), SinkError> {
        if !self.accepts(event) {
            return self.out.ensure_open();
        }
        let line = self.encode(event)?;
        self.out.write_line(line)
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.out.flush()
    }

    fn close(&self) -> Result<(), SinkError> {
        self.out.close()
    }

    fn is_closed(&self) -> bool {
        self.out.is_closed()
    }
}
