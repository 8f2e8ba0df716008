//! Filesystem event source.
//!
//! The engine adds and removes individual directories (or files) from a
//! non-recursive source and consumes a single ordered stream of events.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use tokio::sync::mpsc;

use super::error::WatcherError;

/// Kind of change observed on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Write,
    Create,
    Remove,
    Rename,
}

/// A change to a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl FsEvent {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Non-recursive change notification capability.
///
/// Events for added paths arrive on the receiver handed out when the source
/// is created. [`EventSource::close`] must release every watch and end that
/// stream.
pub trait EventSource: Send {
    /// Start watching a single file or directory (not its subdirectories).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be watched.
    fn add_path(&mut self, path: &Path) -> Result<(), WatcherError>;

    /// Stop watching a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path was not watched.
    fn remove_path(&mut self, path: &Path) -> Result<(), WatcherError>;

    /// Release all watches. Further calls are no-ops.
    fn close(&mut self);
}

/// Event source backed by the platform's native watcher through
/// `notify-debouncer-full`.
pub struct NotifySource {
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl NotifySource {
    /// Create the native watcher.
    ///
    /// Returns the source and the receiver for its events.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be initialized.
    pub fn new(
        debounce: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FsEvent>), WatcherError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in &events {
                        for fs_event in translate(&event.kind, &event.paths) {
                            if event_tx.send(fs_event).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(error = %error, "File watcher error");
                    }
                }
            }
        })?;

        Ok((
            Self {
                debouncer: Some(debouncer),
            },
            event_rx,
        ))
    }
}

impl EventSource for NotifySource {
    fn add_path(&mut self, path: &Path) -> Result<(), WatcherError> {
        let debouncer = self.debouncer.as_mut().ok_or(WatcherError::ChannelClosed)?;
        debouncer.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn remove_path(&mut self, path: &Path) -> Result<(), WatcherError> {
        let debouncer = self.debouncer.as_mut().ok_or(WatcherError::ChannelClosed)?;
        debouncer.unwatch(path)?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(debouncer) = self.debouncer.take() {
            // Joins the debounce thread, which drops the event sender.
            debouncer.stop();
        }
    }
}

impl Drop for NotifySource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map a notify event to engine events.
fn translate(kind: &EventKind, paths: &[PathBuf]) -> Vec<FsEvent> {
    let each = |kind: FsEventKind| {
        paths
            .iter()
            .map(|p| FsEvent::new(p.clone(), kind))
            .collect::<Vec<_>>()
    };

    match kind {
        EventKind::Create(_) => each(FsEventKind::Create),
        EventKind::Remove(_) => each(FsEventKind::Remove),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(FsEventKind::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut events = Vec::with_capacity(2);
            if let Some(from) = paths.first() {
                events.push(FsEvent::new(from.clone(), FsEventKind::Rename));
            }
            if let Some(to) = paths.get(1) {
                events.push(FsEvent::new(to.clone(), FsEventKind::Create));
            }
            events
        }
        EventKind::Modify(ModifyKind::Name(_)) => each(FsEventKind::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => each(FsEventKind::Write),
        _ => Vec::new(),
    }
}
