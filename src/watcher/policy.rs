//! Path eligibility rules shared by the initial scan and live events.

use std::path::Path;

/// Check whether `path` ends with one of the allowed extensions.
///
/// Extensions include the leading dot and compare case-insensitively.
/// A path without an extension never matches.
#[must_use]
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let suffix = format!(".{}", ext.to_string_lossy().to_lowercase());
    extensions.iter().any(|e| e.to_lowercase() == suffix)
}

/// Check whether a directory path contains any exclusion substring.
#[must_use]
pub fn is_excluded_dir(dir: &Path, exclude: &[String]) -> bool {
    if exclude.is_empty() {
        return false;
    }
    let dir = dir.to_string_lossy();
    exclude
        .iter()
        .filter(|pattern| !pattern.is_empty())
        .any(|pattern| dir.contains(pattern.as_str()))
}

/// Check whether `path` falls under `dir`.
///
/// Non-recursive scope covers direct children only; recursive scope covers
/// every descendant. `dir` itself is never in its own scope.
#[must_use]
pub fn in_scope(path: &Path, dir: &Path, recursive: bool) -> bool {
    if recursive {
        path != dir && path.starts_with(dir)
    } else {
        path.parent() == Some(dir)
    }
}
