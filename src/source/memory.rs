//! In-memory event and cycle info source

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CycleInfo, CycleInfoSource, EventsSource, RawEvent, SourceError};

/// Saved source state: the cycle info plus the events, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub cycle_info: CycleInfo,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// Serves a fixed event list and cycle info. Used for tests and for
/// replaying saved snapshots.
pub struct InMemorySource {
    cycle_info: CycleInfo,
    events: Vec<RawEvent>,
    page_requests: AtomicUsize,
}

impl InMemorySource {
    /// `events` must be newest first, as the API delivers them.
    pub fn new(cycle_info: CycleInfo, events: Vec<RawEvent>) -> Self {
        Self {
            cycle_info,
            events,
            page_requests: AtomicUsize::new(0),
        }
    }

    /// Build from events in emission order (oldest first).
    pub fn from_chronological(cycle_info: CycleInfo, mut events: Vec<RawEvent>) -> Self {
        events.reverse();
        Self::new(cycle_info, events)
    }

    /// Load a JSON [`Snapshot`].
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(Self::new(snapshot.cycle_info, snapshot.events))
    }

    /// Number of `fetch_page` calls served so far.
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventsSource for InMemorySource {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<RawEvent>, SourceError> {
        self.page_requests.fetch_add(1, Ordering::Relaxed);
        let page = self
            .events
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(page)
    }
}

#[async_trait]
impl CycleInfoSource for InMemorySource {
    async fn fetch_cycle_info(&self) -> Result<CycleInfo, SourceError> {
        Ok(self.cycle_info)
    }
}
