//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default ceiling above which files are never tailed live (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default line-scanning buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default reconciliation interval (30 minutes).
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30 * 60;

/// Default debounce window for filesystem events.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tailing engine limits.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Individual files to tail.
    #[serde(default)]
    pub log_files: Vec<FileRule>,
    /// Directories whose matching files are tailed.
    #[serde(default)]
    pub log_directories: Vec<DirectoryRule>,
    /// Alert destinations.
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

/// A single file to tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRule {
    pub path: PathBuf,
    pub keywords: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// A directory subtree to tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRule {
    pub path: PathBuf,
    pub keywords: Vec<String>,
    /// Allowed file suffixes including the leading dot, e.g. `.log`.
    pub extensions: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    /// Substrings; any directory whose path contains one is skipped.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Notification channel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Feishu,
    Dingtalk,
}

/// Webhook notifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(rename = "type")]
    pub kind: NotifierKind,
    pub webhook: String,
    /// Signing secret (DingTalk only).
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Limits and timings for the tailing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Files larger than this many bytes are never tailed live.
    pub max_file_size: u64,
    /// Maximum length of a single line in bytes.
    pub buffer_size: usize,
    /// Seconds between reconciliation sweeps.
    pub reconcile_interval_secs: u64,
    /// Debounce window for filesystem events in milliseconds.
    pub debounce_ms: u64,
}

impl EngineSettings {
    /// Reconciliation interval as a [`Duration`].
    #[must_use]
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    /// Debounce window as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

fn default_enabled() -> bool {
    true
}
