//! Error types for the pool monitor

use thiserror::Error;

use crate::source::SourceError;

/// Run-level failure. Per-event problems are counted in the run stats
/// instead.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The events or cycle info source could not be read
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
}

/// Result type for monitor runs
pub type Result<T> = std::result::Result<T, MonitorError>;
