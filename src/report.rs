//! Report rendering
//!
//! Text output for operators and JSON output for scripts.

use std::fmt::{self, Write};

use crate::monitor::MonitorReport;
use crate::planner::Action;

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept {
                stacker,
                amount_ustx,
                cycles,
            } => write!(
                f,
                "Delegation from {} can be accepted for {} uSTX for {} cycles.",
                stacker, amount_ustx, cycles
            ),
            Action::Extend { stacker, cycles } => write!(
                f,
                "Delegation from {} can be extended for {} cycles.",
                stacker, cycles
            ),
            Action::Increase {
                stacker,
                amount_ustx,
            } => write!(
                f,
                "Delegation from {} can be increased by {} uSTX.",
                stacker, amount_ustx
            ),
            Action::Commit {
                reward_address,
                up_to_cycle,
            } => write!(
                f,
                "Delegation can be committed for address {} up until cycle {}.",
                reward_address, up_to_cycle
            ),
            Action::ExtendCommitment {
                reward_address,
                up_to_cycle,
            } => write!(
                f,
                "Delegation for address {} can be extended up until cycle {}.",
                reward_address, up_to_cycle
            ),
            Action::IncreaseCommitment {
                reward_address,
                amount_ustx,
            } => write!(
                f,
                "Delegation for address {} can be increased by {} uSTX.",
                reward_address, amount_ustx
            ),
        }
    }
}

/// Render `report` as text. With `log_entries`, the pruned projections are
/// listed before the actions.
pub fn render_text(report: &MonitorReport, log_entries: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_text(&mut out, report, log_entries);
    out
}

fn write_text(out: &mut String, report: &MonitorReport, log_entries: bool) -> fmt::Result {
    writeln!(out, "Current cycle: {}", report.current_cycle)?;
    writeln!(
        out,
        "Next cycle's prepare phase starts in {} blocks.",
        report.blocks_until_prepare_phase
    )?;
    writeln!(out)?;
    writeln!(out, "Processing PoX data for {}:", report.pool_operator)?;

    if log_entries {
        let projections = &report.projections;

        writeln!(out, "Delegations:")?;
        for (stacker, record) in &projections.delegations {
            writeln!(out, "  {}: {}", stacker, record)?;
        }
        writeln!(out)?;

        writeln!(out, "Accepted Delegations:")?;
        for (stacker, record) in &projections.accepted {
            writeln!(out, "  {}: {}", stacker, record)?;
        }
        writeln!(out)?;

        writeln!(out, "Committed Delegations:")?;
        for (address, commitments) in &projections.committed {
            writeln!(out, "  {}:", address)?;
            for interval in commitments.intervals() {
                writeln!(
                    out,
                    "    cycles {}..{}, {} uSTX",
                    interval.start_cycle, interval.end_cycle, interval.amount_ustx
                )?;
            }
        }
        writeln!(out)?;
    }

    for action in &report.actions {
        writeln!(out, "{}", action)?;
    }

    if !report.needs_action() {
        writeln!(out, "There's no action left to do for {}", report.pool_operator)?;
    }

    Ok(())
}

/// Render `report` as pretty-printed JSON.
pub fn render_json(report: &MonitorReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
