//! Store: the records of one JSON run log plus query and aggregation helpers.
//!
//! [`LogStore::load`] always rebuilds everything from the start of the file,
//! so reloading a log that is still being appended to yields each record
//! exactly once with ids renumbered `0..N` in file order. Queries borrow from
//! the store and never mutate it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::QueryError;
use crate::normalizer;
use crate::types::{LogRecord, RecordId, Severity};

/// File suffix of the shared JSON run log.
pub const JSON_LOG_SUFFIX: &str = ".json.log";

/// Columns every [`Table`] starts with, in order.
pub const CORE_COLUMNS: [&str; 9] = [
    "id",
    "timestamp",
    "level",
    "logger",
    "message",
    "module",
    "function",
    "line",
    "exception",
];

/// Outcome of one [`LogStore::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub records: usize,
    /// Non-blank lines that failed normalization.
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct LogStore {
    path: Option<PathBuf>,
    records: Vec<LogRecord>,
    skipped: usize,
    level_counts: HashMap<String, usize>,
    module_counts: HashMap<String, usize>,
    func_counts: HashMap<String, usize>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a shared JSON run log, rejecting paths without the `.json.log` suffix.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let is_json_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(JSON_LOG_SUFFIX));
        if !is_json_log {
            return Err(QueryError::InvalidPath(path.to_path_buf()));
        }

        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }

    /// Replace all records and counters with a fresh parse of `path`.
    ///
    /// Blank lines are ignored. Lines that fail normalization (including a
    /// trailing line still being written, or one that is not valid UTF-8)
    /// are skipped and counted in [`LoadReport::skipped`]. An unreadable file
    /// fails the whole load and leaves the previous contents untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, QueryError> {
        let path = path.as_ref();
        let io_err = |source| QueryError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = BufReader::new(File::open(path).map_err(io_err)?);
        let mut records = Vec::new();
        let mut skipped = 0;
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(io_err)? == 0 {
                break;
            }
            line_no += 1;

            let line = buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match normalizer::parse_bytes(line, records.len()) {
                Ok(record) => records.push(record),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(path = %path.display(), line = line_no, error = %err, "skipping malformed log line");
                }
            }
        }

        self.path = Some(path.to_path_buf());
        self.records = records;
        self.skipped = skipped;
        self.recount();

        let report = LoadReport {
            records: self.records.len(),
            skipped,
        };
        tracing::debug!(path = %path.display(), records = report.records, skipped, "loaded run log");
        Ok(report)
    }

    /// Re-run [`load`](Self::load) on the most recently loaded path.
    pub fn reload(&mut self) -> Result<LoadReport, QueryError> {
        let path = self.path.clone().ok_or(QueryError::NotLoaded)?;
        self.load(path)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lines skipped by the most recent load.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    /// Records whose `level` is one of `levels`, in file order.
    pub fn filter_by_level<S: AsRef<str>>(&self, levels: &[S]) -> Vec<&LogRecord> {
        self.records
            .iter()
            .filter(|r| levels.iter().any(|l| l.as_ref() == r.level))
            .collect()
    }

    /// Records whose level names a built-in severity at or above `min`.
    /// Levels that do not resolve to a known severity are excluded.
    pub fn filter_at_or_above(&self, min: &Severity) -> Vec<&LogRecord> {
        self.records
            .iter()
            .filter(|r| r.severity().is_some_and(|s| s.is_at_least(min)))
            .collect()
    }

    /// Records with `start <= timestamp <= end`; a `None` bound is open.
    pub fn filter_by_time(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<&LogRecord> {
        self.records
            .iter()
            .filter(|r| start.map_or(true, |s| r.timestamp >= s))
            .filter(|r| end.map_or(true, |e| r.timestamp <= e))
            .collect()
    }

    /// Records whose extras contain `key`, whatever its value.
    pub fn filter_by_extra(&self, key: &str) -> Vec<&LogRecord> {
        self.records
            .iter()
            .filter(|r| r.extras.contains_key(key))
            .collect()
    }

    /// `record.extras[key]`, or `default` when absent.
    pub fn get_extra(&self, record: &LogRecord, key: &str, default: impl Into<Value>) -> Value {
        record.extra_or(key, default)
    }

    // -----------------------------------------------------------------------
    // Lookup by id
    // -----------------------------------------------------------------------

    pub fn get(&self, id: RecordId) -> Result<&LogRecord, QueryError> {
        self.records.get(id).ok_or(QueryError::RecordNotFound {
            id,
            len: self.records.len(),
        })
    }

    /// Records for `ids`, in the order the ids were given.
    pub fn get_many(&self, ids: &[RecordId]) -> Result<Vec<&LogRecord>, QueryError> {
        ids.iter().map(|&id| self.get(id)).collect()
    }

    /// Look up one id or a list of ids.
    pub fn select(&self, ids: impl Into<RecordIds>) -> Result<Selection<'_>, QueryError> {
        match ids.into() {
            RecordIds::One(id) => self.get(id).map(Selection::One),
            RecordIds::Many(ids) => self.get_many(&ids).map(Selection::Many),
        }
    }

    // -----------------------------------------------------------------------
    // Aggregation
    // -----------------------------------------------------------------------

    /// The `n` most frequent exact message texts, most frequent first. Ties
    /// keep the order in which the messages first appeared.
    pub fn top_messages(&self, n: usize) -> Vec<(String, usize)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(&str, usize)> = Vec::new();

        for record in &self.records {
            match index.get(record.message.as_str()) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(record.message.as_str(), counts.len());
                    counts.push((record.message.as_str(), 1));
                }
            }
        }

        // stable: equal counts stay in first-appearance order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(n)
            .map(|(message, count)| (message.to_string(), count))
            .collect()
    }

    pub fn level_counts(&self) -> HashMap<String, usize> {
        self.level_counts.clone()
    }

    pub fn module_counts(&self) -> HashMap<String, usize> {
        self.module_counts.clone()
    }

    pub fn func_counts(&self) -> HashMap<String, usize> {
        self.func_counts.clone()
    }

    /// Flatten `records` (or every loaded record when `None`) into a table.
    pub fn to_table(&self, records: Option<&[&LogRecord]>) -> Table {
        match records {
            Some(records) => Table::from_records(records.iter().copied()),
            None => Table::from_records(self.records.iter()),
        }
    }

    fn recount(&mut self) {
        self.level_counts.clear();
        self.module_counts.clear();
        self.func_counts.clear();
        for record in &self.records {
            *self.level_counts.entry(record.level.clone()).or_default() += 1;
            *self.module_counts.entry(record.module.clone()).or_default() += 1;
            *self.func_counts.entry(record.function.clone()).or_default() += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Id selection
// ---------------------------------------------------------------------------

/// One record id or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIds {
    One(RecordId),
    Many(Vec<RecordId>),
}

impl From<RecordId> for RecordIds {
    fn from(id: RecordId) -> Self {
        RecordIds::One(id)
    }
}

impl From<Vec<RecordId>> for RecordIds {
    fn from(ids: Vec<RecordId>) -> Self {
        RecordIds::Many(ids)
    }
}

impl From<&[RecordId]> for RecordIds {
    fn from(ids: &[RecordId]) -> Self {
        RecordIds::Many(ids.to_vec())
    }
}

/// Ids arriving as JSON must be non-negative integers (or arrays of them);
/// strings, floats and anything else are rejected.
impl TryFrom<&Value> for RecordIds {
    type Error = QueryError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        fn one(value: &Value) -> Result<RecordId, QueryError> {
            value
                .as_u64()
                .and_then(|id| RecordId::try_from(id).ok())
                .ok_or_else(|| QueryError::InvalidId(value.to_string()))
        }

        match value {
            Value::Array(items) => items
                .iter()
                .map(one)
                .collect::<Result<Vec<_>, _>>()
                .map(RecordIds::Many),
            other => one(other).map(RecordIds::One),
        }
    }
}

/// Result of [`LogStore::select`], shaped like the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    One(&'a LogRecord),
    Many(Vec<&'a LogRecord>),
}

impl<'a> Selection<'a> {
    pub fn into_vec(self) -> Vec<&'a LogRecord> {
        match self {
            Selection::One(record) => vec![record],
            Selection::Many(records) => records,
        }
    }
}

// ---------------------------------------------------------------------------
// Tabular projection
// ---------------------------------------------------------------------------

/// Records flattened into string cells.
///
/// Extras keys become columns after [`CORE_COLUMNS`], in first-appearance
/// order; a record without a given key gets an empty cell. An extras key that
/// shares a core column's name overwrites that cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a LogRecord>) -> Self {
        let records: Vec<&LogRecord> = records.into_iter().collect();

        let mut columns: Vec<String> = CORE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for record in &records {
            for key in record.extras.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![
                    record.id.to_string(),
                    record
                        .timestamp
                        .to_rfc3339_opts(SecondsFormat::Micros, true),
                    record.level.clone(),
                    record.logger.clone(),
                    record.message.clone(),
                    record.module.clone(),
                    record.function.clone(),
                    record.line.map(|l| l.to_string()).unwrap_or_default(),
                    record.exception.clone(),
                ];
                row.resize(columns.len(), String::new());
                for (key, value) in &record.extras {
                    if let Some(idx) = columns.iter().position(|c| c == key) {
                        row[idx] = cell(value);
                    }
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every cell of `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
