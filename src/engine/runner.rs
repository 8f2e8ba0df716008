//! Engine lifecycle: rule registration, event consumer, reconciliation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::alert::Dispatcher;
use crate::config::Config;
use crate::notifier::Notifier;
use crate::watcher::{EventSource, FsEvent, NotifySource};

use super::error::EngineError;
use super::tail::TailEngine;

/// Snapshot of what the engine is tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub tracked_files: usize,
    pub watched_dirs: usize,
    pub file_rules: usize,
    pub directory_rules: usize,
}

/// A running log monitor instance.
///
/// Created explicitly and owned by the caller; several instances may
/// coexist in one process.
pub struct LogSentinel {
    config: Config,
    engine: Arc<TailEngine>,
    events: Option<mpsc::UnboundedReceiver<FsEvent>>,
    cancel: CancellationToken,
    consumer: Option<JoinHandle<()>>,
    reconciler: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for LogSentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSentinel")
            .field("engine", &self.engine)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl LogSentinel {
    /// Create an engine over an arbitrary event source.
    #[must_use]
    pub fn new(
        config: Config,
        source: Box<dyn EventSource>,
        events: mpsc::UnboundedReceiver<FsEvent>,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        let engine = TailEngine::new(&config.engine, source, Dispatcher::new(notifiers));
        Self {
            config,
            engine: Arc::new(engine),
            events: Some(events),
            cancel: CancellationToken::new(),
            consumer: None,
            reconciler: None,
        }
    }

    /// Create an engine backed by the platform's native file watcher.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Source`] if the watcher cannot be initialized.
    pub fn with_native_watcher(
        config: Config,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Result<Self, EngineError> {
        let (source, events) =
            NotifySource::new(config.engine.debounce()).map_err(EngineError::Source)?;
        Ok(Self::new(config, Box::new(source), events, notifiers))
    }

    /// Shared engine state.
    #[must_use]
    pub fn engine(&self) -> &Arc<TailEngine> {
        &self.engine
    }

    /// Whether `start` has run and `stop` has not.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.consumer.is_some()
    }

    /// Register every enabled rule, then start the event consumer and the
    /// reconciliation task.
    ///
    /// A rule that cannot be registered is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyStarted`] if called twice.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let events = self.events.take().ok_or(EngineError::AlreadyStarted)?;

        self.register_rules();

        let engine = Arc::clone(&self.engine);
        let cancel = self.cancel.clone();
        self.consumer = Some(tokio::spawn(consume_events(engine, events, cancel)));

        let engine = Arc::clone(&self.engine);
        let cancel = self.cancel.clone();
        let interval = self.config.engine.reconcile_interval();
        self.reconciler = Some(tokio::spawn(reconcile_loop(engine, interval, cancel)));

        let stats = self.stats();
        tracing::info!(
            tracked_files = stats.tracked_files,
            watched_dirs = stats.watched_dirs,
            "Log sentinel started"
        );
        Ok(())
    }

    fn register_rules(&self) {
        for rule in &self.config.log_files {
            if !rule.enabled {
                tracing::debug!(path = %rule.path.display(), "Skipping disabled file rule");
                continue;
            }
            match self.engine.register_file(rule) {
                Ok(path) => tracing::info!(path = %path.display(), "Watching file"),
                Err(e) => {
                    tracing::warn!(path = %rule.path.display(), error = %e, "Failed to watch file");
                }
            }
        }

        for rule in &self.config.log_directories {
            if !rule.enabled {
                tracing::debug!(path = %rule.path.display(), "Skipping disabled directory rule");
                continue;
            }
            match self.engine.register_directory(rule) {
                Ok(directories) => tracing::info!(
                    path = %rule.path.display(),
                    recursive = rule.recursive,
                    directories,
                    "Watching directory"
                ),
                Err(e) => tracing::warn!(
                    path = %rule.path.display(),
                    error = %e,
                    "Failed to watch directory"
                ),
            }
        }
    }

    /// Stop the engine and release every filesystem watch.
    ///
    /// In-flight alert deliveries are not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotStarted`] if the engine is not running, or
    /// a join error if a background task panicked.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        let consumer = self.consumer.take().ok_or(EngineError::NotStarted)?;

        self.cancel.cancel();
        self.engine.close_source();

        consumer.await?;
        if let Some(reconciler) = self.reconciler.take() {
            reconciler.await?;
        }

        tracing::info!("Log sentinel stopped");
        Ok(())
    }

    /// Current tracking counts.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let registry = self.engine.registry();
        EngineStats {
            tracked_files: self.engine.offsets().len(),
            watched_dirs: registry.watched_dirs().len(),
            file_rules: registry.file_count(),
            directory_rules: registry.directory_rule_count(),
        }
    }
}

/// Handle events one at a time, in arrival order, until the stream ends.
async fn consume_events(
    engine: Arc<TailEngine>,
    mut events: mpsc::UnboundedReceiver<FsEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("Event stream closed");
                    break;
                };
                engine.handle_event(event).await;
            }
        }
    }
}

async fn reconcile_loop(engine: Arc<TailEngine>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                engine.reconcile().await;
            }
        }
    }
}
