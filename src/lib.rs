//! Log Sentinel - tail log files and directories, alert on keyword matches.

pub mod alert;
pub mod config;
pub mod engine;
pub mod notifier;
pub mod watcher;
