//! Projection state and event application

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::commitments::Commitments;
use crate::events::{DomainEvent, UNBOUNDED_CYCLE};

/// A delegation or accepted lock for one stacker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationRecord {
    pub start_cycle: u64,
    pub end_cycle: u64,
    pub reward_address: Option<String>,
    pub amount_ustx: u128,
}

/// Capital the pool has locked for a stacker. Same shape as a delegation.
pub type AcceptedRecord = DelegationRecord;

impl fmt::Display for DelegationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end_cycle == UNBOUNDED_CYCLE {
            write!(f, "cycles {}.. (open-ended)", self.start_cycle)?;
        } else {
            write!(f, "cycles {}..{}", self.start_cycle, self.end_cycle)?;
        }
        write!(f, ", {} uSTX", self.amount_ustx)?;
        match &self.reward_address {
            Some(address) => write!(f, ", reward address {}", address),
            None => write!(f, ", no reward address"),
        }
    }
}

/// The three projections, keyed by stacker or reward address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projections {
    pub delegations: BTreeMap<String, DelegationRecord>,
    pub accepted: BTreeMap<String, AcceptedRecord>,
    pub committed: BTreeMap<String, Commitments>,
}

impl Projections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.delegations.is_empty() && self.accepted.is_empty() && self.committed.is_empty()
    }

    /// Apply one event. Returns `false` when the event did not change anything
    /// (an extend or increase that does not line up with the accepted lock,
    /// a commit without a reward address, ...).
    pub fn apply(&mut self, event: &DomainEvent) -> bool {
        match event {
            DomainEvent::DelegateStx {
                stacker,
                start_cycle,
                end_cycle,
                amount_ustx,
                reward_address,
            } => {
                self.delegations.insert(
                    stacker.clone(),
                    DelegationRecord {
                        start_cycle: *start_cycle,
                        end_cycle: *end_cycle,
                        reward_address: reward_address.clone(),
                        amount_ustx: *amount_ustx,
                    },
                );
                true
            }

            DomainEvent::RevokeDelegateStx { stacker } => {
                self.delegations.remove(stacker).is_some()
            }

            DomainEvent::DelegateStackStx {
                stacker,
                start_cycle,
                end_cycle,
                amount_ustx,
                reward_address,
            } => {
                self.accepted.insert(
                    stacker.clone(),
                    AcceptedRecord {
                        start_cycle: *start_cycle,
                        end_cycle: *end_cycle,
                        reward_address: reward_address.clone(),
                        amount_ustx: *amount_ustx,
                    },
                );
                true
            }

            DomainEvent::DelegateStackExtend {
                stacker,
                start_cycle,
                end_cycle,
                ..
            } => match self.accepted.get_mut(stacker) {
                Some(existing) if existing.end_cycle == *start_cycle => {
                    existing.end_cycle = *end_cycle;
                    true
                }
                existing => {
                    debug!(
                        %stacker,
                        accepted_end = ?existing.map(|e| e.end_cycle),
                        extend_start = start_cycle,
                        "Ignoring non-contiguous extend"
                    );
                    false
                }
            },

            DomainEvent::DelegateStackIncrease {
                stacker,
                start_cycle,
                end_cycle,
                increase_by,
                total_locked,
                ..
            } => match self.accepted.get_mut(stacker) {
                Some(existing)
                    if existing.start_cycle == *start_cycle
                        && existing.end_cycle == *end_cycle
                        && existing.amount_ustx.checked_add(*increase_by) == Some(*total_locked) =>
                {
                    existing.amount_ustx = *total_locked;
                    true
                }
                _ => {
                    debug!(%stacker, "Ignoring inconsistent increase");
                    false
                }
            },

            DomainEvent::StackAggregationCommit {
                cycle,
                amount_ustx,
                reward_address,
            } => match reward_address {
                Some(address) => {
                    self.committed
                        .entry(address.clone())
                        .or_default()
                        .commit(*cycle, *amount_ustx);
                    true
                }
                None => false,
            },

            DomainEvent::StackAggregationIncrease {
                cycle,
                amount_ustx,
                reward_address,
                ..
            } => reward_address
                .as_ref()
                .and_then(|address| self.committed.get_mut(address))
                .is_some_and(|commitments| commitments.increase(*cycle, *amount_ustx)),
        }
    }

    /// Drop every entry that ended by `current_cycle`. Each projection is
    /// rebuilt from its surviving entries.
    pub fn prune(&mut self, current_cycle: u64) {
        let is_active = |record: &DelegationRecord| record.end_cycle > current_cycle;

        self.delegations = std::mem::take(&mut self.delegations)
            .into_iter()
            .filter(|(_, record)| is_active(record))
            .collect();

        self.accepted = std::mem::take(&mut self.accepted)
            .into_iter()
            .filter(|(_, record)| is_active(record))
            .collect();

        self.committed = std::mem::take(&mut self.committed)
            .into_iter()
            .filter_map(|(address, mut commitments)| {
                commitments
                    .retain_active(current_cycle)
                    .then_some((address, commitments))
            })
            .collect();
    }
}
