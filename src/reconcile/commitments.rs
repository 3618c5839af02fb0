//! Committed intervals for one reward address

use serde::Serialize;

/// A run of consecutive cycles committed with the same amount.
/// `end_cycle` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommittedInterval {
    pub start_cycle: u64,
    pub end_cycle: u64,
    pub amount_ustx: u128,
}

impl CommittedInterval {
    fn single(cycle: u64, amount_ustx: u128) -> Self {
        Self {
            start_cycle: cycle,
            end_cycle: cycle.saturating_add(1),
            amount_ustx,
        }
    }

    pub fn contains(&self, cycle: u64) -> bool {
        self.start_cycle <= cycle && cycle < self.end_cycle
    }
}

/// Sorted, non-overlapping committed intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Commitments(Vec<CommittedInterval>);

impl Commitments {
    pub fn intervals(&self) -> &[CommittedInterval] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record a commitment of `amount_ustx` for `cycle`.
    pub fn commit(&mut self, cycle: u64, amount_ustx: u128) {
        // In-order commits extend or follow the last interval.
        if let Some(last) = self.0.last_mut() {
            if last.end_cycle == cycle && last.amount_ustx == amount_ustx {
                last.end_cycle = cycle.saturating_add(1);
                return;
            }
            if last.end_cycle <= cycle {
                self.0.push(CommittedInterval::single(cycle, amount_ustx));
                return;
            }
        }

        let position = self.0.partition_point(|interval| interval.end_cycle <= cycle);
        match self.0.get_mut(position) {
            // A covered cycle adds to the interval's amount and leaves its
            // bounds alone.
            Some(existing) if existing.contains(cycle) => {
                existing.amount_ustx = existing.amount_ustx.saturating_add(amount_ustx);
            }
            _ => {
                self.0
                    .insert(position, CommittedInterval::single(cycle, amount_ustx));
                self.merge_neighbours(position);
            }
        }
    }

    /// Add `amount_ustx` to the interval starting at `cycle`. Returns `false`
    /// when no interval starts there. Intervals are never merged here.
    pub fn increase(&mut self, cycle: u64, amount_ustx: u128) -> bool {
        match self.0.iter_mut().find(|interval| interval.start_cycle == cycle) {
            Some(interval) => {
                interval.amount_ustx = interval.amount_ustx.saturating_add(amount_ustx);
                true
            }
            None => false,
        }
    }

    pub fn max_end_cycle(&self) -> Option<u64> {
        self.0.iter().map(|interval| interval.end_cycle).max()
    }

    pub fn total_amount(&self) -> u128 {
        self.0
            .iter()
            .fold(0u128, |total, interval| total.saturating_add(interval.amount_ustx))
    }

    /// Keep the intervals still running after `current_cycle`. Returns
    /// whether any are left.
    pub fn retain_active(&mut self, current_cycle: u64) -> bool {
        self.0.retain(|interval| interval.end_cycle > current_cycle);
        !self.0.is_empty()
    }

    /// Merge the freshly inserted interval at `index` with equal-amount
    /// neighbours it touches. Other intervals keep their bounds.
    fn merge_neighbours(&mut self, index: usize) {
        if let Some(next) = self.0.get(index + 1).copied() {
            let current = &mut self.0[index];
            if current.end_cycle == next.start_cycle && current.amount_ustx == next.amount_ustx {
                current.end_cycle = next.end_cycle;
                self.0.remove(index + 1);
            }
        }
        if index > 0 {
            let current = self.0[index];
            let previous = &mut self.0[index - 1];
            if previous.end_cycle == current.start_cycle
                && previous.amount_ustx == current.amount_ustx
            {
                previous.end_cycle = current.end_cycle;
                self.0.remove(index);
            }
        }
    }
}
