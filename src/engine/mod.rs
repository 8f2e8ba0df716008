//! The log tailing engine.
//!
//! [`LogSentinel`] owns the lifecycle; [`TailEngine`] holds the shared state
//! the event consumer and the reconciliation task operate on.

mod error;
mod runner;
mod tail;

pub use error::EngineError;
pub use runner::{EngineStats, LogSentinel};
pub use tail::{ReconcileReport, TailEngine};
