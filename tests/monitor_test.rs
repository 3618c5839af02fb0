//! End-to-end monitor runs over in-memory sources

use std::sync::Arc;

use pretty_assertions::assert_eq;

use pox_monitor::{
    render_text, Action, BitcoinAddressCodec, CycleInfo, InMemorySource, MatchMode, MonitorConfig,
    MonitorReport, Network, PoolMonitor, RawEvent,
};

const POOL: &str = "SPPOOL";
const POOL_HASH: &str = "0x0000000000000000000000000000000000000000";
const POOL_BTC: &str = "1111111111111111111114oLvT2";

fn pox_addr() -> String {
    format!("(some (tuple (hashbytes {}) (version 0x00)))", POOL_HASH)
}

fn print(name: &str, stacker: &str, data: &str) -> String {
    format!(
        "(ok (tuple (balance u100000) (burnchain-unlock-height u0) (data (tuple {})) (locked u0) (name \"{}\") (stacker '{})))",
        data, name, stacker
    )
}

fn delegate_stx(stacker: &str, pool: &str, amount: u128, start: u64, end: Option<u64>) -> String {
    let end = match end {
        Some(end) => format!("(some u{})", end),
        None => "none".to_string(),
    };
    print(
        "delegate-stx",
        stacker,
        &format!(
            "(amount-ustx u{}) (delegate-to '{}) (end-cycle-id {}) (pox-addr {}) (start-cycle-id u{}) (unlock-burn-height none)",
            amount,
            pool,
            end,
            pox_addr(),
            start
        ),
    )
}

fn revoke(stacker: &str) -> String {
    print(
        "revoke-delegate-stx",
        stacker,
        &format!("(delegate-to '{}) (end-cycle-id none) (start-cycle-id u5)", POOL),
    )
}

fn delegate_stack_stx(stacker: &str, amount: u128, start: u64, end: u64) -> String {
    print(
        "delegate-stack-stx",
        POOL,
        &format!(
            "(delegator '{}) (end-cycle-id (some u{})) (lock-amount u{}) (lock-period u{}) (pox-addr {}) (stacker '{}) (start-burn-height u100) (start-cycle-id u{}) (unlock-burn-height u2000)",
            POOL,
            end,
            amount,
            end - start,
            pox_addr(),
            stacker,
            start
        ),
    )
}

fn aggregation_commit(cycle: u64, amount: u128) -> String {
    print(
        "stack-aggregation-commit-indexed",
        POOL,
        &format!(
            "(amount-ustx u{}) (end-cycle-id (some u{})) (pox-addr {}) (reward-cycle u{}) (sender '{}) (start-cycle-id u{})",
            amount,
            cycle + 1,
            pox_addr(),
            cycle,
            POOL,
            cycle
        ),
    )
}

/// Chronological reprs to newest-first raw events.
fn feed(reprs: Vec<String>) -> Vec<RawEvent> {
    let mut events: Vec<RawEvent> = reprs
        .into_iter()
        .enumerate()
        .map(|(i, repr)| RawEvent::new(format!("0x{:04x}", i), 0, repr))
        .collect();
    events.reverse();
    events
}

async fn run(reprs: Vec<String>, current_cycle: u64, match_mode: MatchMode) -> MonitorReport {
    let source = Arc::new(InMemorySource::new(
        CycleInfo {
            current_cycle,
            blocks_until_prepare_phase: 50,
        },
        feed(reprs),
    ));
    let mut config = MonitorConfig::new(POOL, Network::Mainnet);
    config.page_size = 3;
    config.match_mode = match_mode;

    PoolMonitor::new(config, source.clone(), source, Arc::new(BitcoinAddressCodec))
        .run()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_accepted_delegation_only_needs_commit() {
    let report = run(
        vec![
            delegate_stx("SP1", POOL, 1000, 5, Some(17)),
            delegate_stack_stx("SP1", 1000, 5, 17),
        ],
        5,
        MatchMode::Prefilter,
    )
    .await;

    assert_eq!(
        report.actions,
        vec![Action::Commit {
            reward_address: POOL_BTC.into(),
            up_to_cycle: 17,
        }]
    );
}

#[tokio::test]
async fn test_unaccepted_delegation_needs_accept() {
    let report = run(
        vec![delegate_stx("SP2", POOL, 500, 5, Some(9))],
        5,
        MatchMode::Prefilter,
    )
    .await;

    assert_eq!(
        report.actions,
        vec![Action::Accept {
            stacker: "SP2".into(),
            amount_ustx: 500,
            cycles: 4,
        }]
    );
}

#[tokio::test]
async fn test_feed_is_replayed_oldest_first() {
    // Delegation revoked then renewed: the renewal must win.
    let report = run(
        vec![
            delegate_stx("SP1", POOL, 1000, 5, None),
            revoke("SP1"),
            delegate_stx("SP1", POOL, 700, 5, None),
        ],
        5,
        MatchMode::Prefilter,
    )
    .await;

    assert_eq!(report.projections.delegations["SP1"].amount_ustx, 700);
    assert_eq!(
        report.actions,
        vec![Action::Accept {
            stacker: "SP1".into(),
            amount_ustx: 700,
            cycles: 12,
        }]
    );
}

#[tokio::test]
async fn test_malformed_and_foreign_entries_are_counted() {
    let mut reprs = vec![
        delegate_stx("SP3", "SPOTHER", 900, 5, None),
        format!("(ok (tuple (name \"delegate-stx\") (stacker '{}) (data (tuple (amount-ustx u1", POOL),
        print("delegate-stx", "SP4", &format!("(delegate-to '{}) (start-cycle-id u5)", POOL)),
        delegate_stx("SP1", POOL, 1000, 5, Some(17)),
        delegate_stack_stx("SP1", 1000, 5, 17),
    ];
    reprs.extend((5..17).map(|cycle| aggregation_commit(cycle, 1000)));

    let report = run(reprs, 5, MatchMode::Prefilter).await;

    assert_eq!(report.stats.fetched, 17);
    assert_eq!(report.stats.foreign, 1);
    assert_eq!(report.stats.malformed, 2);
    assert_eq!(report.stats.decoded, 14);
    assert_eq!(report.projections.committed[POOL_BTC].intervals().len(), 1);
    assert!(report.actions.is_empty());

    let text = render_text(&report, false);
    assert!(text.ends_with("There's no action left to do for SPPOOL\n"));
}

#[tokio::test]
async fn test_strict_mode_ignores_incidental_mentions() {
    // SP5 delegated elsewhere but a memo field mentions the pool; only
    // delegate-to decides in strict mode.
    let mention = print(
        "delegate-stx",
        "SP5",
        &format!(
            "(amount-ustx u10) (delegate-to 'SPOTHER) (end-cycle-id none) (memo \"{}\") (pox-addr none) (start-cycle-id u5)",
            POOL
        ),
    );

    let prefiltered = run(vec![mention.clone()], 5, MatchMode::Prefilter).await;
    assert!(prefiltered.projections.delegations.contains_key("SP5"));

    let strict = run(vec![mention], 5, MatchMode::Strict).await;
    assert!(strict.projections.delegations.is_empty());
    assert_eq!(strict.stats.foreign, 1);
}

#[tokio::test]
async fn test_expired_entries_are_pruned() {
    let report = run(
        vec![
            delegate_stx("SP1", POOL, 1000, 1, Some(4)),
            delegate_stack_stx("SP1", 1000, 1, 4),
            aggregation_commit(1, 1000),
            aggregation_commit(2, 1000),
            aggregation_commit(3, 1000),
        ],
        4,
        MatchMode::Prefilter,
    )
    .await;

    assert!(report.projections.is_empty());
    assert!(!report.needs_action());
}
