//! pox-monitor: stacking pool operator monitor
//!
//! Replays the PoX-4 contract's print events for a pool operator and works out
//! what the operator still has to do: accept new delegations, extend or
//! increase accepted ones, and commit the locked capital for its reward
//! addresses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ EventsSource │──▶│   clarity    │──▶│    events    │──▶│  reconcile   │
//! │ (Hiro API)   │   │ value parser │   │   decoder    │   │ projections  │
//! └──────────────┘   └──────────────┘   └──────┬───────┘   └──────┬───────┘
//!                                              │                  │
//!                                       ┌──────┴───────┐   ┌──────▼───────┐
//!                                       │ AddressCodec │   │   planner    │
//!                                       └──────────────┘   └──────────────┘
//! ```
//!
//! The parser, decoder, reconciliation engine and planner never perform I/O.
//! [`monitor::PoolMonitor`] wires them to the sources for a single run.

pub mod address;
pub mod clarity;
pub mod config;
pub mod error;
pub mod events;
pub mod monitor;
pub mod planner;
pub mod reconcile;
pub mod report;
pub mod source;

pub use address::{AddressCodec, AddressError, BitcoinAddressCodec, BitcoinNetwork};
pub use clarity::{parse_event_repr, parse_value, MalformedValueError, StructuredValue, Tuple};
pub use config::{Args, Network, OutputFormat};
pub use error::{MonitorError, Result};
pub use events::{Decoded, DomainEvent, EventDecoder, EventKind, MalformedEventError, MatchMode};
pub use monitor::{MonitorConfig, MonitorReport, PoolMonitor, RunStats};
pub use planner::{plan, Action, DEFAULT_MAX_HORIZON};
pub use reconcile::{replay, Commitments, CommittedInterval, DelegationRecord, Projections};
pub use report::{render_json, render_text};
pub use source::{
    CycleInfo, CycleInfoSource, EventsSource, HiroClient, HiroConfig, InMemorySource, RawEvent,
    Snapshot, SourceError,
};
