//! Transaction log writer
//!
//! Appends newline-delimited JSON records. The engine never reads or
//! truncates the log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::Result;

use super::{Action, LogRecord};

/// Append-only audit log
#[derive(Debug)]
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record, creating the file on first use
    pub fn append(&self, action: Action, key: &str, value: Option<&Value>) -> Result<LogRecord> {
        let record = LogRecord::new(action, key, value.cloned());

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;

        Ok(record)
    }

    /// Read every well-formed record, in append order.
    ///
    /// Malformed lines are skipped. A missing file reads as empty.
    pub fn read_all(path: &Path) -> Result<Vec<LogRecord>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "skipping malformed log record");
                }
            }
        }
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
