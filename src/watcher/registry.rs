//! Registry of watch rules and the directories they cover.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{DirectoryRule, FileRule};

use super::matcher::KeywordMatcher;
use super::policy::{in_scope, is_excluded_dir, matches_extension};

/// A registered single-file rule.
#[derive(Debug, Clone)]
pub struct FileWatch {
    pub rule: FileRule,
    pub matcher: Arc<KeywordMatcher>,
}

/// A registered directory rule.
#[derive(Debug, Clone)]
pub struct DirectoryWatch {
    pub rule: DirectoryRule,
    pub matcher: Arc<KeywordMatcher>,
}

impl DirectoryWatch {
    /// Whether `file` is a tailable file under this rule.
    #[must_use]
    pub fn covers_file(&self, file: &Path) -> bool {
        if !in_scope(file, &self.rule.path, self.rule.recursive) {
            return false;
        }
        if !matches_extension(file, &self.rule.extensions) {
            return false;
        }
        if self.rule.recursive {
            let parent = file.parent().unwrap_or(&self.rule.path);
            return !is_excluded_dir(parent, &self.rule.exclude_dirs);
        }
        true
    }

    /// Whether `dir` is a subdirectory this rule should watch.
    ///
    /// Only recursive rules pick up subdirectories.
    #[must_use]
    pub fn covers_subdir(&self, dir: &Path) -> bool {
        self.rule.recursive
            && in_scope(dir, &self.rule.path, true)
            && !is_excluded_dir(dir, &self.rule.exclude_dirs)
    }
}

/// Watch declarations keyed by path.
///
/// Rule paths are expected to be absolute; the engine canonicalizes them
/// before registration so they line up with paths reported by the event
/// source. Directory rules are consulted in registration order and the
/// first covering rule wins.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    files: HashMap<PathBuf, FileWatch>,
    directories: Vec<DirectoryWatch>,
    watched_dirs: BTreeSet<PathBuf>,
}

impl WatchRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single-file rule.
    pub fn add_file(&mut self, rule: FileRule) {
        let matcher = Arc::new(KeywordMatcher::new(&rule.keywords));
        self.files
            .insert(rule.path.clone(), FileWatch { rule, matcher });
    }

    /// Register a directory rule.
    pub fn add_directory(&mut self, rule: DirectoryRule) {
        let matcher = Arc::new(KeywordMatcher::new(&rule.keywords));
        self.directories.push(DirectoryWatch { rule, matcher });
    }

    /// Record that a directory is being watched by the event source.
    ///
    /// Returns `false` if it was already recorded.
    pub fn mark_watched(&mut self, dir: &Path) -> bool {
        self.watched_dirs.insert(dir.to_path_buf())
    }

    /// Forget a watched directory. Returns `true` if it was recorded.
    pub fn unmark_watched(&mut self, dir: &Path) -> bool {
        self.watched_dirs.remove(dir)
    }

    /// Forget `dir` and every watched directory below it.
    ///
    /// Returns the released paths, deepest first.
    pub fn unmark_watched_tree(&mut self, dir: &Path) -> Vec<PathBuf> {
        let released: Vec<PathBuf> = self
            .watched_dirs
            .iter()
            .filter(|watched| watched.starts_with(dir))
            .cloned()
            .collect();
        for path in &released {
            self.watched_dirs.remove(path);
        }
        released.into_iter().rev().collect()
    }

    /// Whether a directory is currently watched.
    #[must_use]
    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched_dirs.contains(dir)
    }

    /// Resolve the keyword set that applies to a concrete file path.
    ///
    /// File rules take precedence over directory rules.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<Arc<KeywordMatcher>> {
        if let Some(watch) = self.files.get(path) {
            return Some(watch.matcher.clone());
        }
        self.directory_for_file(path).map(|d| d.matcher.clone())
    }

    /// First directory rule covering a file path.
    #[must_use]
    pub fn directory_for_file(&self, path: &Path) -> Option<&DirectoryWatch> {
        self.directories.iter().find(|d| d.covers_file(path))
    }

    /// First recursive directory rule that should watch `dir`.
    #[must_use]
    pub fn directory_for_subdir(&self, dir: &Path) -> Option<&DirectoryWatch> {
        self.directories.iter().find(|d| d.covers_subdir(dir))
    }

    /// Whether `path` is the target of a file rule.
    #[must_use]
    pub fn is_file_rule(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Number of registered file rules.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of registered directory rules.
    #[must_use]
    pub fn directory_rule_count(&self) -> usize {
        self.directories.len()
    }

    /// Directories currently watched, sorted.
    #[must_use]
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.watched_dirs.iter().cloned().collect()
    }
}
