//! Pool monitor
//!
//! Drives one reconciliation run: fetch cycle info, page through the PoX
//! contract's events, decode the pool's events, replay them oldest first and
//! plan the pending actions.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::address::AddressCodec;
use crate::config::Network;
use crate::error::Result;
use crate::events::{Decoded, DomainEvent, EventDecoder, MatchMode, SkipReason};
use crate::planner::{plan, Action, DEFAULT_MAX_HORIZON};
use crate::reconcile::Projections;
use crate::source::{CycleInfoSource, EventsSource};

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub pool_operator: String,
    pub network: Network,
    pub page_size: u32,
    pub max_horizon: u64,
    pub match_mode: MatchMode,
}

impl MonitorConfig {
    pub fn new(pool_operator: impl Into<String>, network: Network) -> Self {
        Self {
            pool_operator: pool_operator.into(),
            network,
            page_size: 100,
            max_horizon: DEFAULT_MAX_HORIZON,
            match_mode: MatchMode::default(),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Pages requested, including the final empty one
    pub pages: u32,
    /// Entries returned by the source
    pub fetched: u64,
    /// Entries without a printed value
    pub non_log: u64,
    /// Pool events decoded
    pub decoded: u64,
    /// Events of other pools
    pub foreign: u64,
    /// Events with a name the monitor does not track
    pub unrecognized: u64,
    /// Entries that failed to parse or decode
    pub malformed: u64,
    /// Decoded events that left the projections unchanged
    pub ignored_mutations: u64,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub pool_operator: String,
    pub current_cycle: u64,
    pub blocks_until_prepare_phase: i64,
    pub actions: Vec<Action>,
    pub projections: Projections,
    pub stats: RunStats,
}

impl MonitorReport {
    pub fn needs_action(&self) -> bool {
        !self.actions.is_empty()
    }
}

pub struct PoolMonitor {
    config: MonitorConfig,
    events: Arc<dyn EventsSource>,
    cycles: Arc<dyn CycleInfoSource>,
    decoder: EventDecoder,
}

impl PoolMonitor {
    pub fn new(
        config: MonitorConfig,
        events: Arc<dyn EventsSource>,
        cycles: Arc<dyn CycleInfoSource>,
        codec: Arc<dyn AddressCodec>,
    ) -> Self {
        let decoder = EventDecoder::new(
            config.pool_operator.clone(),
            config.network.bitcoin_network(),
            codec,
        )
        .with_match_mode(config.match_mode);

        Self {
            config,
            events,
            cycles,
            decoder,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<MonitorReport> {
        let cycle_info = self.cycles.fetch_cycle_info().await?;
        info!(
            current_cycle = cycle_info.current_cycle,
            blocks_until_prepare_phase = cycle_info.blocks_until_prepare_phase,
            "Fetched cycle info"
        );

        let mut stats = RunStats::default();
        let mut pool_events = self.collect_events(&mut stats).await?;
        // Sources deliver newest first; replay needs emission order.
        pool_events.reverse();

        let mut projections = Projections::new();
        for event in &pool_events {
            if !projections.apply(event) {
                stats.ignored_mutations += 1;
            }
        }
        projections.prune(cycle_info.current_cycle);

        let actions = plan(&projections, cycle_info.current_cycle, self.config.max_horizon);
        info!(
            pool = %self.config.pool_operator,
            events = stats.decoded,
            malformed = stats.malformed,
            actions = actions.len(),
            "Reconciliation complete"
        );

        Ok(MonitorReport {
            pool_operator: self.config.pool_operator.clone(),
            current_cycle: cycle_info.current_cycle,
            blocks_until_prepare_phase: cycle_info.blocks_until_prepare_phase,
            actions,
            projections,
            stats,
        })
    }

    /// Page through the source until an empty page, keeping the pool's events
    /// in delivery order.
    async fn collect_events(&self, stats: &mut RunStats) -> Result<Vec<DomainEvent>> {
        let mut pool_events = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self.events.fetch_page(offset, self.config.page_size).await?;
            stats.pages += 1;
            if page.is_empty() {
                break;
            }
            debug!(offset, count = page.len(), "Processing events page");
            stats.fetched += page.len() as u64;

            for raw in &page {
                let Some(repr) = raw.repr.as_deref() else {
                    stats.non_log += 1;
                    continue;
                };

                match self.decoder.decode_repr(repr) {
                    Ok(Decoded::Event(event)) => {
                        stats.decoded += 1;
                        pool_events.push(event);
                    }
                    Ok(Decoded::Skip(SkipReason::ForeignPool)) => stats.foreign += 1,
                    Ok(Decoded::Skip(SkipReason::Unrecognized(name))) => {
                        debug!(tx_id = %raw.tx_id, ?name, "Skipping untracked event");
                        stats.unrecognized += 1;
                    }
                    Err(e) => {
                        debug!(
                            tx_id = %raw.tx_id,
                            event_index = raw.event_index,
                            error = %e,
                            "Skipping malformed event"
                        );
                        stats.malformed += 1;
                    }
                }
            }

            offset = offset.saturating_add(self.config.page_size);
        }

        Ok(pool_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::BitcoinAddressCodec;
    use crate::source::{CycleInfo, InMemorySource, RawEvent};

    #[test]
    fn test_paging_stops_on_empty_page() {
        let events = vec![
            RawEvent::new("0x03", 0, "(ok (tuple (name \"handle-unlock\") (stacker 'SPPOOL)))"),
            RawEvent {
                tx_id: "0x02".into(),
                event_index: 0,
                repr: None,
            },
            RawEvent::new("0x01", 0, "(ok (tuple (name \"delegate-stx\") (stacker 'SPOTHER)))"),
        ];
        let source = Arc::new(InMemorySource::new(
            CycleInfo {
                current_cycle: 5,
                blocks_until_prepare_phase: 10,
            },
            events,
        ));

        let mut config = MonitorConfig::new("SPPOOL", Network::Mainnet);
        config.page_size = 2;
        let monitor = PoolMonitor::new(
            config,
            source.clone(),
            source.clone(),
            Arc::new(BitcoinAddressCodec),
        );

        let report = tokio_test::block_on(monitor.run()).unwrap();
        assert_eq!(source.page_requests(), 3);
        assert_eq!(
            report.stats,
            RunStats {
                pages: 3,
                fetched: 3,
                non_log: 1,
                decoded: 0,
                foreign: 1,
                unrecognized: 1,
                malformed: 0,
                ignored_mutations: 0,
            }
        );
        assert!(!report.needs_action());
    }
}
