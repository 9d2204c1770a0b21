//! Run directory layout.
//!
//! ```text
//! <root>/<YYYY-MM-DD>/<YYYY-MM-DD_HHMMSS>/
//!     <run_stamp>.json.log       shared JSON run log
//!     <run_stamp>_<name>.log     one readable file per registered name
//! ```
//!
//! The run stamp has one-second resolution. Two runs started in the same
//! second under the same root resolve to the same directory and share it;
//! their files are opened in append mode so neither truncates the other.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use runlog_core::store::JSON_LOG_SUFFIX;

pub const DAILY_STAMP_FORMAT: &str = "%Y-%m-%d";
pub const RUN_STAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Directory and identifiers of the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    daily_stamp: String,
    run_stamp: String,
    run_directory: PathBuf,
    run_id: String,
}

impl RunContext {
    /// Stamp the run with the current local time and create its directory.
    pub fn initialize(root: impl AsRef<Path>) -> io::Result<Self> {
        Self::initialize_at(root, Local::now())
    }

    pub fn initialize_at(root: impl AsRef<Path>, now: DateTime<Local>) -> io::Result<Self> {
        let daily_stamp = now.format(DAILY_STAMP_FORMAT).to_string();
        let run_stamp = now.format(RUN_STAMP_FORMAT).to_string();
        let run_directory = root.as_ref().join(&daily_stamp).join(&run_stamp);

        let ctx = Self {
            daily_stamp,
            run_id: run_stamp.clone(),
            run_stamp,
            run_directory,
        };
        ctx.ensure_directory()?;
        Ok(ctx)
    }

    /// Create the run directory if it is missing. Safe to call repeatedly
    /// and from several threads at once.
    pub fn ensure_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.run_directory)
    }

    /// `<run_stamp>_<label>`, used to tag per-name files.
    pub fn compose_run_id(&self, label: &str) -> String {
        format!("{}_{}", self.run_stamp, label)
    }

    pub fn json_log_path(&self) -> PathBuf {
        self.run_directory
            .join(format!("{}{}", self.run_stamp, JSON_LOG_SUFFIX))
    }

    pub fn text_log_path(&self, name: &str) -> PathBuf {
        self.run_directory
            .join(format!("{}.log", self.compose_run_id(name)))
    }

    /// Path for an additional, name-scoped JSON sink.
    pub fn named_json_log_path(&self, name: &str) -> PathBuf {
        self.run_directory
            .join(format!("{}{}", self.compose_run_id(name), JSON_LOG_SUFFIX))
    }

    pub fn daily_stamp(&self) -> &str {
        &self.daily_stamp
    }

    pub fn run_stamp(&self) -> &str {
        &self.run_stamp
    }

    pub fn run_directory(&self) -> &Path {
        &self.run_directory
    }

    /// Identifier of the run itself; equal to the run stamp.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}
