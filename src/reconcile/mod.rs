//! Reconciliation engine
//!
//! Replays decoded events, oldest first, into three projections:
//!
//! - `delegations`: what stackers have delegated to the pool
//! - `accepted`: what the pool has locked on their behalf
//! - `committed`: what the pool has committed per reward address and cycle
//!
//! Replay is a pure function of the event sequence; the order matters (a
//! revoke followed by a delegation is not the same as the reverse).

pub mod commitments;
pub mod projections;

pub use commitments::{Commitments, CommittedInterval};
pub use projections::{AcceptedRecord, DelegationRecord, Projections};

use crate::events::DomainEvent;

/// Replay `events` in order and prune everything that ended by
/// `current_cycle`.
pub fn replay<'a, I>(events: I, current_cycle: u64) -> Projections
where
    I: IntoIterator<Item = &'a DomainEvent>,
{
    let mut projections = Projections::new();
    for event in events {
        projections.apply(event);
    }
    projections.prune(current_cycle);
    projections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn delegate(stacker: &str, start: u64, end: u64, amount: u128) -> DomainEvent {
        DomainEvent::DelegateStx {
            stacker: stacker.into(),
            start_cycle: start,
            end_cycle: end,
            amount_ustx: amount,
            reward_address: Some("bc1qpool".into()),
        }
    }

    fn revoke(stacker: &str) -> DomainEvent {
        DomainEvent::RevokeDelegateStx {
            stacker: stacker.into(),
        }
    }

    fn accept(stacker: &str, start: u64, end: u64, amount: u128) -> DomainEvent {
        DomainEvent::DelegateStackStx {
            stacker: stacker.into(),
            start_cycle: start,
            end_cycle: end,
            amount_ustx: amount,
            reward_address: Some("bc1qpool".into()),
        }
    }

    fn commit(cycle: u64, amount: u128) -> DomainEvent {
        DomainEvent::StackAggregationCommit {
            cycle,
            amount_ustx: amount,
            reward_address: Some("bc1qpool".into()),
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events = vec![
            delegate("SP1", 5, 17, 1000),
            accept("SP1", 5, 8, 1000),
            commit(5, 1000),
            commit(6, 1000),
            delegate("SP2", 6, 9, 300),
        ];

        assert_eq!(replay(&events, 5), replay(&events, 5));
    }

    #[test]
    fn test_replay_order_matters() {
        let events = vec![delegate("SP1", 0, 5, 1000), revoke("SP1")];

        let forward = replay(&events, 0);
        assert!(!forward.delegations.contains_key("SP1"));

        let backward = replay(events.iter().rev(), 0);
        assert!(backward.delegations.contains_key("SP1"));
    }

    #[test]
    fn test_replay_prunes_expired_entries() {
        let events = vec![
            delegate("SP1", 1, 5, 1000),
            delegate("SP2", 1, 9, 1000),
            accept("SP2", 1, 5, 1000),
            commit(4, 1000),
            commit(6, 500),
        ];

        let projections = replay(&events, 5);
        assert_eq!(projections.delegations.keys().collect::<Vec<_>>(), vec!["SP2"]);
        assert!(projections.accepted.is_empty());
        assert_eq!(
            projections.committed["bc1qpool"].intervals(),
            &[CommittedInterval { start_cycle: 6, end_cycle: 7, amount_ustx: 500 }]
        );
    }
}
