//! HTTP client for the Hiro Stacks API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CycleInfo, CycleInfoSource, EventsSource, RawEvent, SourceError};
use crate::config::Network;

/// Hiro API client configuration
#[derive(Debug, Clone)]
pub struct HiroConfig {
    /// Base URL without trailing slash (e.g. https://api.mainnet.hiro.so)
    pub base_url: String,
    /// Contract whose events are listed
    pub contract_id: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Wait before retrying a 429 response
    pub retry_delay: Duration,
    /// 429 retries before giving up
    pub max_retries: u32,
}

impl HiroConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            base_url: network.api_base_url().to_string(),
            contract_id: network.pox_contract().to_string(),
            ..Default::default()
        }
    }
}

impl Default for HiroConfig {
    fn default() -> Self {
        Self {
            base_url: Network::Mainnet.api_base_url().to_string(),
            contract_id: Network::Mainnet.pox_contract().to_string(),
            timeout_secs: 30,
            retry_delay: Duration::from_secs(10),
            max_retries: 30,
        }
    }
}

/// Reads PoX contract events and cycle info from the Hiro API.
pub struct HiroClient {
    config: HiroConfig,
    client: Client,
}

impl HiroClient {
    pub fn new(config: HiroConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HiroConfig {
        &self.config
    }

    fn events_url(&self, offset: u32, limit: u32) -> String {
        format!(
            "{}/extended/v1/tx/events?address={}&limit={}&offset={}",
            self.config.base_url, self.config.contract_id, limit, offset
        )
    }

    fn pox_url(&self) -> String {
        format!("{}/v2/pox", self.config.base_url)
    }

    /// GET `url`, sleeping `retry_delay` between attempts while the API
    /// answers 429.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let response = self.client.get(url).send().await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempts > self.config.max_retries {
                    return Err(SourceError::RateLimited { attempts });
                }
                warn!(
                    url,
                    attempt = attempts,
                    delay_ms = self.config.retry_delay.as_millis() as u64,
                    "Rate limited, retrying"
                );
                tokio::time::sleep(self.config.retry_delay).await;
                continue;
            }

            return self.handle_response(response).await;
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SourceError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status,
                message: body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    #[serde(default)]
    tx_id: String,
    #[serde(default)]
    event_index: u32,
    #[serde(default)]
    contract_log: Option<ContractLog>,
}

#[derive(Debug, Deserialize)]
struct ContractLog {
    value: ContractLogValue,
}

#[derive(Debug, Deserialize)]
struct ContractLogValue {
    repr: String,
}

impl From<ApiEvent> for RawEvent {
    fn from(event: ApiEvent) -> Self {
        RawEvent {
            tx_id: event.tx_id,
            event_index: event.event_index,
            repr: event.contract_log.map(|log| log.value.repr),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PoxResponse {
    current_cycle: PoxCurrentCycle,
    next_cycle: PoxNextCycle,
}

#[derive(Debug, Deserialize)]
struct PoxCurrentCycle {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct PoxNextCycle {
    blocks_until_prepare_phase: i64,
}

#[async_trait]
impl EventsSource for HiroClient {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<RawEvent>, SourceError> {
        let url = self.events_url(offset, limit);
        let response: EventsResponse = self.get_json(&url).await?;
        debug!(offset, limit, count = response.events.len(), "Fetched events page");
        Ok(response.events.into_iter().map(RawEvent::from).collect())
    }
}

#[async_trait]
impl CycleInfoSource for HiroClient {
    async fn fetch_cycle_info(&self) -> Result<CycleInfo, SourceError> {
        let response: PoxResponse = self.get_json(&self.pox_url()).await?;
        Ok(CycleInfo {
            current_cycle: response.current_cycle.id,
            blocks_until_prepare_phase: response.next_cycle.blocks_until_prepare_phase,
        })
    }
}
