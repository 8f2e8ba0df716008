//! Filesystem watching and incremental log reading.
//!
//! Leaf components of the tailing engine: path policy, offsets, the rule
//! registry, the event source, the line tailer, and keyword matching.

mod error;
mod matcher;
mod offsets;
mod policy;
mod registry;
mod source;
mod tailer;

pub use error::WatcherError;
pub use matcher::KeywordMatcher;
pub use offsets::OffsetStore;
pub use policy::{in_scope, is_excluded_dir, matches_extension};
pub use registry::{DirectoryWatch, FileWatch, WatchRegistry};
pub use source::{EventSource, FsEvent, FsEventKind, NotifySource};
pub use tailer::LineTailer;
