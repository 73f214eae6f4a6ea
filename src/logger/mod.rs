//! Activity logging: a shared handle over the JSONL writer.

pub mod jsonl;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use self::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Cheaply cloneable handle to the activity log. Clones share one writer, so
/// lines from the action worker and the UI thread never interleave.
#[derive(Clone)]
pub struct ActivityLog {
    writer: Arc<Mutex<JsonlWriter>>,
}

impl ActivityLog {
    /// Log to `path`, or nowhere when `path` is `None`.
    pub fn open(path: Option<PathBuf>) -> Self {
        let config = JsonlConfig {
            path,
            ..JsonlConfig::default()
        };
        Self::with_writer(JsonlWriter::open(config))
    }

    /// A log that drops everything.
    pub fn disabled() -> Self {
        Self::with_writer(JsonlWriter::discard())
    }

    fn with_writer(writer: JsonlWriter) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn record(&self, entry: &LogEntry) {
        self.writer.lock().write_entry(entry);
    }

    /// Writer state: `normal`, `stderr` or `discard`.
    pub fn state(&self) -> String {
        self.writer.lock().state().to_string()
    }

    pub fn panel_rendered(&self, panel: &str, shown: usize, total: usize) {
        self.record(
            &LogEntry::new(EventType::PanelRendered, Severity::Info)
                .panel(panel)
                .details(format!("{shown} of {total} rows")),
        );
    }

    pub fn config_loaded(&self, source: &str, hash: &str) {
        self.record(
            &LogEntry::new(EventType::ConfigLoaded, Severity::Info)
                .details(format!("source={source} hash={hash}")),
        );
    }

    pub fn validation_failed(&self, form: &str, messages: usize) {
        self.record(
            &LogEntry::new(EventType::ValidationFailed, Severity::Warning)
                .details(format!("{form}: {messages} field error(s)")),
        );
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("state", &self.state())
            .finish()
    }
}
