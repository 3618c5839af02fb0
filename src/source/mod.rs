//! Event and cycle info sources
//!
//! The monitor only needs two things from the outside world: the PoX
//! contract's print events, newest first, one page at a time, and the current
//! reward cycle. Both sit behind traits so runs can be driven from the Hiro
//! API or from memory.

pub mod hiro;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hiro::{HiroClient, HiroConfig};
pub use memory::{InMemorySource, Snapshot};

/// One contract event as delivered by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub tx_id: String,
    pub event_index: u32,
    /// Printed Clarity value. `None` for entries that are not contract logs.
    #[serde(default)]
    pub repr: Option<String>,
}

impl RawEvent {
    pub fn new(tx_id: impl Into<String>, event_index: u32, repr: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            event_index,
            repr: Some(repr.into()),
        }
    }
}

/// Where the chain currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleInfo {
    pub current_cycle: u64,
    pub blocks_until_prepare_phase: i64,
}

/// Source errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    /// Still rate limited after the retry budget was spent
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Pages of contract events, newest first.
#[async_trait]
pub trait EventsSource: Send + Sync {
    /// Fetch up to `limit` events starting at `offset`. An empty page marks
    /// the end of the history.
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<RawEvent>, SourceError>;
}

#[async_trait]
pub trait CycleInfoSource: Send + Sync {
    async fn fetch_cycle_info(&self) -> Result<CycleInfo, SourceError>;
}
