//! Alerts and their fan-out to notifiers.

mod dispatch;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

pub use dispatch::Dispatcher;

/// Timestamp layout used in alert messages.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A matched line, built per match and dropped after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub path: PathBuf,
    pub line: String,
    pub timestamp: DateTime<Local>,
}

impl Alert {
    /// Create an alert stamped with the current local time.
    #[must_use]
    pub fn new(path: &Path, line: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            line: line.into(),
            timestamp: Local::now(),
        }
    }

    /// Render the message body sent to every notifier.
    ///
    /// The line is included verbatim.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "🚨 Log alert\n\nFile: {}\nTime: {}\nContent: {}",
            self.path.display(),
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.line
        )
    }
}
