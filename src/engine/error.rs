//! Engine error types.

use crate::watcher::WatcherError;

/// Errors from starting or stopping the engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The filesystem event source could not be created.
    #[error("Failed to initialize file watcher: {0}")]
    Source(#[source] WatcherError),

    /// `start` was called twice.
    #[error("Engine already started")]
    AlreadyStarted,

    /// `stop` was called before `start`.
    #[error("Engine not started")]
    NotStarted,

    /// A background task panicked.
    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}
