//! runlog-core: types, normalizer and query engine for runlog.
//!
//! This crate holds everything that does not own an open output handle:
//! the [`Severity`] scale, the [`LogEvent`] sinks persist, the canonical
//! [`LogRecord`] read back from a JSON run log, line templates, and the
//! [`LogStore`] that loads and queries a run log.
//!
//! # Data flow
//!
//! ```text
//! LogEvent ──► (runlog-sinks) ──► <run>.json.log ──► normalizer ──► LogStore
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod normalizer;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{ParseError, QueryError};
pub use format::FormatTemplate;
pub use store::{LoadReport, LogStore, RecordIds, Selection, Table};
pub use types::{Extras, LogEvent, LogRecord, RecordId, Severity};
