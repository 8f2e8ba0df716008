//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while watching or tailing files.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Watched file was deleted.
    #[error("Watched file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A single line exceeded the scanning buffer.
    #[error("Line longer than {limit} bytes in {path}")]
    LineTooLong { path: PathBuf, limit: usize },

    /// File rule points at something other than a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Directory rule points at something other than a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event channel closed.
    #[error("Channel closed")]
    ChannelClosed,
}

impl WatcherError {
    /// Map an I/O error on `path` to the most specific variant.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileDeleted(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }
}
