//! JSONL writer: append-only line-delimited JSON activity log.
//!
//! Each line is a self-contained JSON object, assembled in memory and written with
//! a single `write_all` so a concurrent tail never sees a partial line.
//!
//! Degradation chain on write failure:
//! 1. Primary file path
//! 2. stderr with `[SBD-JSONL]` prefix
//! 3. Silent discard (the daemon must never die for logging failures)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{BoardError, Result};

/// Severity label carried on every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One activity log line. Optional fields are omitted from the JSON when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Event kind, snake_case.
    pub event: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// New entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: &str, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event: event.to_string(),
            severity,
            instance: None,
            stop_id: None,
            routes: None,
            window_minutes: None,
            duration_ms: None,
            error_code: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Size at which the current file is rotated aside, in bytes.
    pub max_size_bytes: u64,
    /// Rotated files kept before the oldest is deleted.
    pub max_rotated_files: u32,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("activity.jsonl"),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Append-only JSONL writer with rotation and stderr fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, degrading to stderr when the path is unusable.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        match open_append(&config.path) {
            Ok((file, size)) => Self {
                config,
                writer: Some(BufWriter::new(file)),
                state: WriterState::Normal,
                bytes_written: size,
            },
            Err(err) => {
                let _ = writeln!(
                    io::stderr(),
                    "[SBD-JSONL] log path unusable, falling back to stderr: {err}"
                );
                Self {
                    config,
                    writer: None,
                    state: WriterState::Stderr,
                    bytes_written: 0,
                }
            }
        }
    }

    /// Write one entry as one line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let Ok(json) = serde_json::to_string(entry) else {
            let _ = writeln!(io::stderr(), "[SBD-JSONL] serialize error, entry dropped");
            return;
        };
        self.write_line(&format!("{json}\n"));
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_ok() {
                        self.bytes_written += line.len() as u64;
                        return;
                    }
                }
                self.writer = None;
                self.state = WriterState::Stderr;
                let _ = write!(io::stderr(), "[SBD-JSONL] {line}");
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[SBD-JSONL] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    /// Shift `log.1` -> `log.2`, current -> `log.1`, and reopen a fresh file.
    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = &self.config.path;
        let _ = fs::remove_file(rotated_name(base, self.config.max_rotated_files));
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(base, i), rotated_name(base, i + 1));
        }
        let _ = rename(base, rotated_name(base, 1));

        match open_append(base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => {
                self.state = WriterState::Stderr;
            }
        }
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| BoardError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| BoardError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
