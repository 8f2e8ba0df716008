//! Event routing, directory traversal, and reconciliation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use walkdir::WalkDir;

use crate::alert::{Alert, Dispatcher};
use crate::config::{DirectoryRule, EngineSettings, FileRule};
use crate::watcher::{
    is_excluded_dir, matches_extension, EventSource, FsEvent, FsEventKind, LineTailer,
    OffsetStore, WatchRegistry, WatcherError,
};

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Offsets dropped because the file no longer exists.
    pub removed: usize,
    /// Offsets moved to end-of-file because the file exceeds the ceiling.
    pub reanchored: usize,
    /// Paths still tracked after the sweep.
    pub tracked: usize,
}

/// Shared tailing state: offsets, rules, the event source, and the sink.
///
/// Event handling and reconciliation both take `io_lock`, so a path is
/// never read and re-anchored at the same time.
pub struct TailEngine {
    offsets: OffsetStore,
    registry: RwLock<WatchRegistry>,
    source: Mutex<Box<dyn EventSource>>,
    tailer: LineTailer,
    dispatcher: Dispatcher,
    io_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for TailEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailEngine")
            .field("offsets", &self.offsets)
            .field("registry", &self.registry)
            .field("tailer", &self.tailer)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl TailEngine {
    /// Create an engine around an event source and a dispatcher.
    #[must_use]
    pub fn new(
        settings: &EngineSettings,
        source: Box<dyn EventSource>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            offsets: OffsetStore::new(),
            registry: RwLock::new(WatchRegistry::new()),
            source: Mutex::new(source),
            tailer: LineTailer::new(settings.max_file_size, settings.buffer_size),
            dispatcher,
            io_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Read offsets.
    #[must_use]
    pub fn offsets(&self) -> &OffsetStore {
        &self.offsets
    }

    /// Read access to the rule registry.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn registry(&self) -> std::sync::RwLockReadGuard<'_, WatchRegistry> {
        self.registry.read().expect("RwLock poisoned")
    }

    fn registry_mut(&self) -> std::sync::RwLockWriteGuard<'_, WatchRegistry> {
        self.registry.write().expect("RwLock poisoned")
    }

    /// Register a single-file rule.
    ///
    /// The file's parent directory is watched so that the file is picked up
    /// again after rotation. Tailing starts at the current end of file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, is not a regular file, or
    /// its directory cannot be watched.
    pub fn register_file(&self, rule: &FileRule) -> Result<PathBuf, WatcherError> {
        let path = canonicalize(&rule.path)?;
        let metadata = std::fs::metadata(&path).map_err(|e| WatcherError::from_io(&path, e))?;
        if !metadata.is_file() {
            return Err(WatcherError::NotAFile(path));
        }

        if let Some(parent) = path.parent() {
            self.watch_directory(parent)?;
        }

        self.offsets.set(&path, metadata.len());
        self.registry_mut().add_file(FileRule {
            path: path.clone(),
            ..rule.clone()
        });
        Ok(path)
    }

    /// Register a directory rule and run its initial traversal.
    ///
    /// Returns the number of directories now watched for this rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, is not a directory, or
    /// cannot be watched. Failures below the root are logged and skipped.
    pub fn register_directory(&self, rule: &DirectoryRule) -> Result<usize, WatcherError> {
        let root = canonicalize(&rule.path)?;
        let metadata = std::fs::metadata(&root).map_err(|e| WatcherError::from_io(&root, e))?;
        if !metadata.is_dir() {
            return Err(WatcherError::NotADirectory(root));
        }

        let rule = DirectoryRule {
            path: root.clone(),
            ..rule.clone()
        };
        self.registry_mut().add_directory(rule.clone());

        if !rule.recursive {
            self.watch_directory(&root)?;
            self.scan_directory(&root, &rule)?;
            return Ok(1);
        }

        if is_excluded_dir(&root, &rule.exclude_dirs) {
            tracing::warn!(path = %root.display(), "Directory root matches an exclusion, nothing watched");
            return Ok(0);
        }
        self.watch_directory(&root)?;
        self.scan_directory(&root, &rule)?;
        Ok(1 + self.watch_subtree(&root, &rule))
    }

    /// Watch and scan every non-excluded directory strictly below `dir`.
    ///
    /// Used both at registration and when a new subdirectory appears, so the
    /// two paths apply the same pruning. Returns the number of directories
    /// watched.
    fn watch_subtree(&self, dir: &Path, rule: &DirectoryRule) -> usize {
        let mut watched = 0;
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !entry.file_type().is_dir() || !is_excluded_dir(entry.path(), &rule.exclude_dirs)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to walk directory");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if let Err(e) = self.watch_directory(path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to watch directory");
                continue;
            }
            if let Err(e) = self.scan_directory(path, rule) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to scan directory");
            }
            watched += 1;
        }
        watched
    }

    /// Add a directory to the event source once.
    fn watch_directory(&self, dir: &Path) -> Result<(), WatcherError> {
        if !self.registry_mut().mark_watched(dir) {
            return Ok(());
        }
        let result = self
            .source
            .lock()
            .expect("Mutex poisoned")
            .add_path(dir);
        if let Err(e) = result {
            self.registry_mut().unmark_watched(dir);
            return Err(e);
        }
        tracing::debug!(path = %dir.display(), "Watching directory");
        Ok(())
    }

    /// Seed offsets for the files directly inside `dir`.
    ///
    /// Matching files start at their current size so existing content is
    /// never alerted on. Files above the size ceiling are skipped.
    /// Subdirectories are not visited. Returns the number of files seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn scan_directory(&self, dir: &Path, rule: &DirectoryRule) -> Result<usize, WatcherError> {
        let entries = std::fs::read_dir(dir).map_err(|e| WatcherError::from_io(dir, e))?;
        let limit = self.tailer.max_file_size();
        let mut seeded = 0;

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !matches_extension(&path, &rule.extensions) {
                continue;
            }
            let Ok(metadata) = std::fs::metadata(&path) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            if metadata.len() > limit {
                tracing::info!(
                    path = %path.display(),
                    size = metadata.len(),
                    limit,
                    "Skipping oversized file"
                );
                continue;
            }

            self.offsets.set(&path, metadata.len());
            seeded += 1;
        }

        Ok(seeded)
    }

    /// Route one filesystem event.
    ///
    /// Returns the number of alerts dispatched.
    pub async fn handle_event(&self, event: FsEvent) -> usize {
        let _guard = self.io_lock.lock().await;
        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "Filesystem event");

        match event.kind {
            FsEventKind::Write => self.handle_write(&event.path).await,
            FsEventKind::Create => {
                self.handle_create(&event.path);
                0
            }
            FsEventKind::Remove => {
                self.forget(&event.path, "Log file removed");
                0
            }
            FsEventKind::Rename => {
                self.forget(&event.path, "Log file renamed");
                0
            }
        }
    }

    async fn handle_write(&self, path: &Path) -> usize {
        let matcher = self.registry().resolve(path);
        let Some(matcher) = matcher else {
            return 0;
        };

        let lines = match self.tailer.read_new_lines(path, &self.offsets).await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read new lines");
                return 0;
            }
        };

        let mut alerts = 0;
        for line in lines {
            if let Some(keyword) = matcher.find(&line) {
                tracing::info!(path = %path.display(), keyword, "Keyword matched");
                let alert = Alert::new(path, line);
                self.dispatcher.dispatch(&alert);
                alerts += 1;
            }
        }
        alerts
    }

    fn handle_create(&self, path: &Path) {
        let Ok(metadata) = std::fs::metadata(path) else {
            tracing::debug!(path = %path.display(), "Created path vanished before inspection");
            return;
        };

        if metadata.is_dir() {
            // Directory links are never followed, as in the startup walk.
            if path.is_symlink() {
                tracing::debug!(path = %path.display(), "Ignoring symlinked directory");
                return;
            }
            self.handle_new_directory(path);
            return;
        }

        let covered = {
            let registry = self.registry();
            registry.is_file_rule(path) || registry.directory_for_file(path).is_some()
        };
        if !covered {
            return;
        }

        let limit = self.tailer.max_file_size();
        if metadata.len() > limit {
            tracing::info!(
                path = %path.display(),
                size = metadata.len(),
                limit,
                "Skipping oversized new file"
            );
            return;
        }

        self.offsets.set(path, 0);
        tracing::info!(path = %path.display(), "New log file detected");
    }

    fn handle_new_directory(&self, dir: &Path) {
        let Some(rule) = self
            .registry()
            .directory_for_subdir(dir)
            .map(|watch| watch.rule.clone())
        else {
            return;
        };

        if let Err(e) = self.watch_directory(dir) {
            tracing::warn!(path = %dir.display(), error = %e, "Failed to watch new directory");
            return;
        }
        if let Err(e) = self.scan_directory(dir, &rule) {
            tracing::warn!(path = %dir.display(), error = %e, "Failed to scan new directory");
        }
        let nested = self.watch_subtree(dir, &rule);
        tracing::info!(path = %dir.display(), nested, "New directory watched");
    }

    fn forget(&self, path: &Path, message: &str) {
        let released = self.registry_mut().unmark_watched_tree(path);
        for dir in &released {
            // The native watch may already be gone with the directory.
            let result = self
                .source
                .lock()
                .expect("Mutex poisoned")
                .remove_path(dir);
            if let Err(e) = result {
                tracing::debug!(path = %dir.display(), error = %e, "Directory watch already released");
            }
            tracing::info!(path = %dir.display(), "Stopped watching directory");
        }

        if self.offsets.remove(path).is_some() {
            tracing::info!(path = %path.display(), "{message}");
        }
    }

    /// Correct tracked offsets against the filesystem.
    ///
    /// Drops entries whose file no longer exists, and moves the offset of
    /// any file above the size ceiling to its current end.
    pub async fn reconcile(&self) -> ReconcileReport {
        let _guard = self.io_lock.lock().await;
        let limit = self.tailer.max_file_size();
        let mut report = ReconcileReport::default();

        for (path, offset) in self.offsets.snapshot() {
            match std::fs::metadata(&path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.offsets.remove(&path);
                    report.removed += 1;
                    tracing::info!(path = %path.display(), "Dropped offset for missing file");
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Cannot stat tracked file");
                }
                Ok(metadata) if metadata.len() > limit && offset < metadata.len() => {
                    self.offsets.set(&path, metadata.len());
                    report.reanchored += 1;
                    tracing::info!(
                        path = %path.display(),
                        size = metadata.len(),
                        limit,
                        "Re-anchored oversized file"
                    );
                }
                Ok(_) => {}
            }
        }

        report.tracked = self.offsets.len();
        tracing::info!(
            removed = report.removed,
            reanchored = report.reanchored,
            tracked = report.tracked,
            "Reconciliation complete"
        );
        report
    }

    /// Release every watch held by the event source.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn close_source(&self) {
        self.source.lock().expect("Mutex poisoned").close();
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, WatcherError> {
    std::fs::canonicalize(path).map_err(|e| WatcherError::from_io(path, e))
}
