//! PoX-4 domain events
//!
//! The pool-relevant subset of the PoX-4 contract's print events, decoded
//! once into a closed enum so the reconciliation engine can match on kinds
//! instead of comparing event names.

pub mod decoder;

use std::fmt;

use serde::Serialize;

pub use decoder::{Decoded, DecodeError, EventDecoder, MalformedEventError, MatchMode, SkipReason};

/// End cycle of a delegation that never expires (`end-cycle-id none`).
pub const UNBOUNDED_CYCLE: u64 = u64::MAX;

/// A decoded PoX-4 event, in chain emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DomainEvent {
    /// A stacker delegated to the pool.
    DelegateStx {
        stacker: String,
        start_cycle: u64,
        end_cycle: u64,
        amount_ustx: u128,
        reward_address: Option<String>,
    },
    /// A stacker withdrew its delegation.
    RevokeDelegateStx { stacker: String },
    /// The pool locked a stacker's delegated tokens.
    DelegateStackStx {
        stacker: String,
        start_cycle: u64,
        end_cycle: u64,
        amount_ustx: u128,
        reward_address: Option<String>,
    },
    /// The pool extended a stacker's lock period.
    DelegateStackExtend {
        stacker: String,
        start_cycle: u64,
        end_cycle: u64,
        reward_address: Option<String>,
    },
    /// The pool increased a stacker's locked amount.
    DelegateStackIncrease {
        stacker: String,
        start_cycle: u64,
        end_cycle: u64,
        increase_by: u128,
        total_locked: u128,
        reward_address: Option<String>,
    },
    /// The pool committed locked capital for one reward cycle.
    StackAggregationCommit {
        cycle: u64,
        amount_ustx: u128,
        reward_address: Option<String>,
    },
    /// The pool added capital to an existing commitment.
    StackAggregationIncrease {
        cycle: u64,
        amount_ustx: u128,
        reward_cycle_index: Option<u128>,
        reward_address: Option<String>,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::DelegateStx { .. } => EventKind::DelegateStx,
            DomainEvent::RevokeDelegateStx { .. } => EventKind::RevokeDelegateStx,
            DomainEvent::DelegateStackStx { .. } => EventKind::DelegateStackStx,
            DomainEvent::DelegateStackExtend { .. } => EventKind::DelegateStackExtend,
            DomainEvent::DelegateStackIncrease { .. } => EventKind::DelegateStackIncrease,
            DomainEvent::StackAggregationCommit { .. } => EventKind::StackAggregationCommit,
            DomainEvent::StackAggregationIncrease { .. } => EventKind::StackAggregationIncrease,
        }
    }
}

/// Recognized event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DelegateStx,
    RevokeDelegateStx,
    DelegateStackStx,
    DelegateStackExtend,
    DelegateStackIncrease,
    StackAggregationCommit,
    StackAggregationIncrease,
}

impl EventKind {
    /// Map a print event `name` to its kind. Both commit variants map to
    /// [`EventKind::StackAggregationCommit`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "delegate-stx" => Some(EventKind::DelegateStx),
            "revoke-delegate-stx" => Some(EventKind::RevokeDelegateStx),
            "delegate-stack-stx" => Some(EventKind::DelegateStackStx),
            "delegate-stack-extend" => Some(EventKind::DelegateStackExtend),
            "delegate-stack-increase" => Some(EventKind::DelegateStackIncrease),
            "stack-aggregation-commit" | "stack-aggregation-commit-indexed" => {
                Some(EventKind::StackAggregationCommit)
            }
            "stack-aggregation-increase" => Some(EventKind::StackAggregationIncrease),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DelegateStx => "delegate-stx",
            EventKind::RevokeDelegateStx => "revoke-delegate-stx",
            EventKind::DelegateStackStx => "delegate-stack-stx",
            EventKind::DelegateStackExtend => "delegate-stack-extend",
            EventKind::DelegateStackIncrease => "delegate-stack-increase",
            EventKind::StackAggregationCommit => "stack-aggregation-commit",
            EventKind::StackAggregationIncrease => "stack-aggregation-increase",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            EventKind::from_name("stack-aggregation-commit-indexed"),
            Some(EventKind::StackAggregationCommit)
        );
        assert_eq!(EventKind::from_name("handle-unlock"), None);
        assert_eq!(EventKind::DelegateStackExtend.to_string(), "delegate-stack-extend");
    }
}
