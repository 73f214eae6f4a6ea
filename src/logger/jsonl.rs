//! JSONL activity log: one self-contained JSON object per line.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees half a record.
//!
//! Fallback chain:
//! 1. Primary file path (rotated by size)
//! 2. stderr with `[C2S-JSONL]` prefix
//! 3. Silent discard (a command never fails because logging did)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Activity events emitted by panels and actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PanelRendered,
    ActionStarted,
    ActionCompleted,
    ActionFailed,
    ActionCancelled,
    ConfigLoaded,
    ValidationFailed,
}

/// A single JSONL record. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Panel the event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
    /// Action kind (`refresh`, `export`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// `C2S-xxxx` code when something failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            panel: None,
            action: None,
            details: None,
            duration_ms: None,
            ok: None,
            error_code: None,
            error_message: None,
        }
    }

    #[must_use]
    pub fn panel(mut self, panel: &str) -> Self {
        self.panel = Some(panel.to_string());
        self
    }

    #[must_use]
    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach the code and message of a failure.
    #[must_use]
    pub fn error(mut self, err: &DashError) -> Self {
        self.ok = Some(false);
        self.error_code = Some(err.code().to_string());
        self.error_message = Some(err.to_string());
        self
    }
}

/// Degradation state of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    /// Log file. `None` sends every line straight to the discard state.
    pub path: Option<PathBuf>,
    /// Size threshold for rotation. Default: 10 MiB.
    pub max_size_bytes: u64,
    /// Rotated files kept next to the live one. Default: 3.
    pub max_rotated_files: u32,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl JsonlConfig {
    /// Default limits writing to `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Append-only JSONL writer with rotation and graceful degradation.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, degrading on failure.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        w.try_open_primary();
        w
    }

    /// A writer that drops everything.
    pub fn discard() -> Self {
        Self::open(JsonlConfig::default())
    }

    /// Write one entry as one line and flush it.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[C2S-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
        self.flush();
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Bytes in the live file.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let written = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if written {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[C2S-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        let Some(path) = self.config.path.clone() else {
            self.state = WriterState::Discard;
            return;
        };
        match open_append(&path) {
            Ok((file, size)) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
                self.bytes_written = size;
            }
            Err(e) => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[C2S-JSONL] {e}; logging to stderr");
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => {
                let _ = writeln!(io::stderr(), "[C2S-JSONL] write failed, using stderr");
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        self.flush();
        self.writer = None;
        let Some(base) = self.config.path.clone() else {
            return;
        };

        // .N is dropped, .N-1 → .N, ..., live → .1
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        if self.config.max_rotated_files > 0 {
            let _ = rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DashError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| DashError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse a JSONL file back into entries, skipping lines that do not parse.
pub fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let contents = fs::read_to_string(path).map_err(|source| DashError::io(path, source))?;
    Ok(contents
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_in(dir: &tempfile::TempDir, name: &str) -> (JsonlWriter, PathBuf) {
        let path = dir.path().join(name);
        (JsonlWriter::open(JsonlConfig::at(&path)), path)
    }

    #[test]
    fn entries_are_separate_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let (mut writer, path) = writer_in(&dir, "activity.jsonl");
        writer.write_entry(&LogEntry::new(EventType::PanelRendered, Severity::Info).panel("security"));
        writer.write_entry(&LogEntry::new(EventType::ActionStarted, Severity::Info).action("export"));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "panel_rendered");
        assert_eq!(first["severity"], "info");
        assert_eq!(first["panel"], "security");
    }

    #[test]
    fn optional_fields_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let (mut writer, path) = writer_in(&dir, "sparse.jsonl");
        writer.write_entry(&LogEntry::new(EventType::ConfigLoaded, Severity::Info));
        let line = fs::read_to_string(&path).unwrap();
        assert!(!line.contains("\"panel\""));
        assert!(!line.contains("\"duration_ms\""));
        assert!(!line.contains("\"error_code\""));
    }

    #[test]
    fn error_attaches_code() {
        let err = DashError::ActionFailed {
            action: "export",
            details: "backend down".into(),
        };
        let entry = LogEntry::new(EventType::ActionFailed, Severity::Error).error(&err);
        assert_eq!(entry.ok, Some(false));
        assert_eq!(entry.error_code.as_deref(), Some("C2S-3001"));
    }

    #[test]
    fn rotation_keeps_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut writer = JsonlWriter::open(JsonlConfig {
            path: Some(path.clone()),
            max_size_bytes: 100,
            max_rotated_files: 2,
        });
        for _ in 0..10 {
            writer.write_entry(&LogEntry::new(EventType::PanelRendered, Severity::Info));
        }
        assert!(path.exists());
        assert!(rotated_name(&path, 1).exists());
        assert!(!rotated_name(&path, 3).exists());
    }

    #[test]
    fn unwritable_path_degrades_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file cannot be a parent directory.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let writer = JsonlWriter::open(JsonlConfig::at(blocker.join("activity.jsonl")));
        assert_eq!(writer.state(), "stderr");
    }

    #[test]
    fn no_path_discards() {
        let mut writer = JsonlWriter::discard();
        assert_eq!(writer.state(), "discard");
        writer.write_entry(&LogEntry::new(EventType::ConfigLoaded, Severity::Info));
        assert_eq!(writer.bytes_written(), 0);
    }

    #[test]
    fn read_entries_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let (mut writer, path) = writer_in(&dir, "read.jsonl");
        writer.write_entry(&LogEntry::new(EventType::ActionCompleted, Severity::Info).action("refresh"));
        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, EventType::ActionCompleted);
        assert_eq!(entries[0].action.as_deref(), Some("refresh"));
    }
}
