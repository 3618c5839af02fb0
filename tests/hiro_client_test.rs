//! Hiro API client integration tests against a mock HTTP server

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pox_monitor::{
    Action, BitcoinAddressCodec, CycleInfoSource, EventsSource, HiroClient, HiroConfig,
    MonitorConfig, MonitorError, Network, PoolMonitor, SourceError,
};

const POX_CONTRACT: &str = "SP000000000000000000002Q6VF78.pox-4";

fn client(server: &MockServer, max_retries: u32) -> HiroClient {
    HiroClient::new(HiroConfig {
        base_url: server.uri(),
        contract_id: POX_CONTRACT.to_string(),
        timeout_secs: 5,
        retry_delay: Duration::from_millis(10),
        max_retries,
    })
    .unwrap()
}

fn log_event(tx_id: &str, repr: &str) -> serde_json::Value {
    json!({
        "event_index": 0,
        "event_type": "smart_contract_log",
        "tx_id": tx_id,
        "contract_log": {
            "contract_id": POX_CONTRACT,
            "topic": "print",
            "value": { "hex": "0x", "repr": repr }
        }
    })
}

fn events_page(events: Vec<serde_json::Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "limit": 2,
        "offset": 0,
        "events": events
    }))
}

async fn mount_pox_info(server: &MockServer, cycle: u64) {
    Mock::given(method("GET"))
        .and(path("/v2/pox"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contract_id": POX_CONTRACT,
            "current_cycle": { "id": cycle, "min_threshold_ustx": 0, "stacked_ustx": 0, "is_pox_active": true },
            "next_cycle": { "id": cycle + 1, "blocks_until_prepare_phase": 37 }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_cycle_info() {
    let server = MockServer::start().await;
    mount_pox_info(&server, 84).await;

    let info = client(&server, 0).fetch_cycle_info().await.unwrap();
    assert_eq!(info.current_cycle, 84);
    assert_eq!(info.blocks_until_prepare_phase, 37);
}

#[tokio::test]
async fn test_fetch_page_passes_contract_and_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/events"))
        .and(query_param("address", POX_CONTRACT))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "4"))
        .respond_with(events_page(vec![
            log_event("0xbb", "(ok none)"),
            json!({ "event_index": 1, "event_type": "stx_lock", "tx_id": "0xaa" }),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server, 0).fetch_page(4, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].tx_id, "0xbb");
    assert_eq!(page[0].repr.as_deref(), Some("(ok none)"));
    assert_eq!(page[1].repr, None);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/pox"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_pox_info(&server, 90).await;

    let info = client(&server, 3).fetch_cycle_info().await.unwrap();
    assert_eq!(info.current_cycle, 90);
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/pox"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 2).fetch_cycle_info().await.unwrap_err();
    assert!(matches!(err, SourceError::RateLimited { attempts: 3 }));
}

#[tokio::test]
async fn test_server_error_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/events"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server, 3).fetch_page(0, 100).await.unwrap_err();
    match err {
        SourceError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/pox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server, 0).fetch_cycle_info().await.unwrap_err();
    assert!(matches!(err, SourceError::Decode(_)));
}

#[tokio::test]
async fn test_monitor_run_over_http() {
    let server = MockServer::start().await;
    mount_pox_info(&server, 5).await;

    let delegate = "(ok (tuple (balance u5000) (burnchain-unlock-height u0) (data (tuple (amount-ustx u500) (delegate-to 'SPPOOL) (end-cycle-id (some u9)) (pox-addr none) (start-cycle-id u5) (unlock-burn-height none))) (locked u0) (name \"delegate-stx\") (stacker 'SP2)))";
    let foreign = "(ok (tuple (balance u5000) (burnchain-unlock-height u0) (data (tuple (amount-ustx u800) (delegate-to 'SPOTHER) (end-cycle-id none) (pox-addr none) (start-cycle-id u5) (unlock-burn-height none))) (locked u0) (name \"delegate-stx\") (stacker 'SP3)))";

    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/events"))
        .and(query_param("offset", "0"))
        .respond_with(events_page(vec![
            log_event("0x02", foreign),
            log_event("0x01", delegate),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/events"))
        .and(query_param("offset", "2"))
        .respond_with(events_page(Vec::new()))
        .mount(&server)
        .await;

    let source = Arc::new(client(&server, 0));
    let mut config = MonitorConfig::new("SPPOOL", Network::Mainnet);
    config.page_size = 2;
    let monitor = PoolMonitor::new(config, source.clone(), source, Arc::new(BitcoinAddressCodec));

    let report = monitor.run().await.unwrap();
    assert_eq!(report.stats.pages, 2);
    assert_eq!(report.stats.foreign, 1);
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
async fn test_monitor_fails_when_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/pox"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = Arc::new(client(&server, 0));
    let monitor = PoolMonitor::new(
        MonitorConfig::new("SPPOOL", Network::Mainnet),
        source.clone(),
        source,
        Arc::new(BitcoinAddressCodec),
    );

    let err = monitor.run().await.unwrap_err();
    assert!(matches!(
        err,
        MonitorError::SourceUnavailable(SourceError::Status { status: 503, .. })
    ));
}
