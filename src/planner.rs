//! Action planner
//!
//! Compares the pruned projections and lists what the pool operator still has
//! to do: accept new delegations, extend or increase accepted locks, and
//! commit, extend or increase the aggregated commitments per reward address.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::reconcile::Projections;

/// Maximum number of cycles a lock can reach ahead of the current cycle.
pub const DEFAULT_MAX_HORIZON: u64 = 12;

/// A step the pool operator should take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    /// Lock a delegation the pool has not accepted yet.
    Accept {
        stacker: String,
        amount_ustx: u128,
        cycles: u64,
    },
    /// Extend an accepted lock by `cycles`.
    Extend { stacker: String, cycles: u64 },
    /// Lock the part of a delegation that is not locked yet.
    Increase { stacker: String, amount_ustx: u128 },
    /// Commit locked capital for a reward address for the first time.
    Commit {
        reward_address: String,
        up_to_cycle: u64,
    },
    /// Commit further cycles for a reward address.
    ExtendCommitment {
        reward_address: String,
        up_to_cycle: u64,
    },
    /// Commit more capital for a reward address.
    IncreaseCommitment {
        reward_address: String,
        amount_ustx: u128,
    },
}

#[derive(Default)]
struct AddressTotals {
    max_end_cycle: u64,
    amount_ustx: u128,
}

/// Derive the pending actions from `projections` at `current_cycle`.
pub fn plan(projections: &Projections, current_cycle: u64, max_horizon: u64) -> Vec<Action> {
    let mut actions = Vec::new();

    for (stacker, delegation) in &projections.delegations {
        if !projections.accepted.contains_key(stacker) {
            let cycles = delegation
                .end_cycle
                .saturating_sub(current_cycle)
                .min(max_horizon);
            actions.push(Action::Accept {
                stacker: stacker.clone(),
                amount_ustx: delegation.amount_ustx,
                cycles,
            });
        }
    }

    for (stacker, accepted) in &projections.accepted {
        let Some(delegation) = projections.delegations.get(stacker) else {
            continue;
        };

        let room = max_horizon.saturating_sub(accepted.end_cycle.saturating_sub(current_cycle));
        let cap = delegation
            .end_cycle
            .saturating_sub(1)
            .saturating_sub(current_cycle);
        let cycles = room.min(cap);
        if cycles > 0 {
            actions.push(Action::Extend {
                stacker: stacker.clone(),
                cycles,
            });
        }

        if accepted.amount_ustx < delegation.amount_ustx {
            actions.push(Action::Increase {
                stacker: stacker.clone(),
                amount_ustx: delegation.amount_ustx - accepted.amount_ustx,
            });
        }
    }

    let mut per_address: BTreeMap<&str, AddressTotals> = BTreeMap::new();
    for accepted in projections.accepted.values() {
        let Some(address) = accepted.reward_address.as_deref() else {
            continue;
        };
        let totals = per_address.entry(address).or_default();
        totals.max_end_cycle = totals.max_end_cycle.max(accepted.end_cycle);
        totals.amount_ustx = totals.amount_ustx.saturating_add(accepted.amount_ustx);
    }

    for (address, totals) in per_address {
        let Some(committed) = projections.committed.get(address) else {
            actions.push(Action::Commit {
                reward_address: address.to_string(),
                up_to_cycle: totals.max_end_cycle,
            });
            continue;
        };

        if committed.max_end_cycle().unwrap_or(0) < totals.max_end_cycle {
            actions.push(Action::ExtendCommitment {
                reward_address: address.to_string(),
                up_to_cycle: totals.max_end_cycle,
            });
        }

        let committed_amount = committed.total_amount();
        if totals.amount_ustx > committed_amount {
            actions.push(Action::IncreaseCommitment {
                reward_address: address.to_string(),
                amount_ustx: totals.amount_ustx - committed_amount,
            });
        }
    }

    actions
}
