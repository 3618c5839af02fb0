//! Configuration for pox-monitor
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::address::BitcoinNetwork;
use crate::events::MatchMode;
use crate::monitor::MonitorConfig;
use crate::planner::DEFAULT_MAX_HORIZON;
use crate::source::HiroConfig;

/// Stacks network the pool operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Testnet,
    NakamotoTestnet,
}

impl Network {
    pub fn api_base_url(self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet.hiro.so",
            Network::Testnet => "https://api.testnet.hiro.so",
            Network::NakamotoTestnet => "https://api.nakamoto.testnet.hiro.so",
        }
    }

    /// Fully qualified id of the PoX-4 contract.
    pub fn pox_contract(self) -> &'static str {
        match self {
            Network::Mainnet => "SP000000000000000000002Q6VF78.pox-4",
            Network::Testnet | Network::NakamotoTestnet => "ST000000000000000000002AMW42H.pox-4",
        }
    }

    /// Bitcoin network reward addresses are rendered for.
    pub fn bitcoin_network(self) -> BitcoinNetwork {
        match self {
            Network::Mainnet => BitcoinNetwork::Mainnet,
            Network::Testnet | Network::NakamotoTestnet => BitcoinNetwork::Testnet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// pox-monitor - stacking pool reconciliation for PoX-4
#[derive(Parser, Debug, Clone)]
#[command(name = "pox-monitor")]
#[command(about = "Lists the pending actions of a PoX-4 stacking pool operator")]
pub struct Args {
    /// Pool operator principal (e.g. SP...pool or SP....pool-contract)
    #[arg(long, env = "POOL_OPERATOR")]
    pub pool_operator: String,

    /// Stacks network
    #[arg(long, env = "NETWORK", value_enum, default_value = "mainnet")]
    pub network: Network,

    /// Print the pruned delegations, locks and commitments with the report
    #[arg(long, env = "LOG_ENTRIES", default_value = "false")]
    pub log_entries: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// API base URL override (defaults to the network's Hiro API)
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Events fetched per page
    #[arg(long, env = "PAGE_SIZE", default_value = "100")]
    pub page_size: u32,

    /// Delay before retrying a rate limited request, in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "10000")]
    pub retry_delay_ms: u64,

    /// Rate limit retries before giving up
    #[arg(long, env = "MAX_RETRIES", default_value = "30")]
    pub max_retries: u32,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Maximum number of cycles a lock may reach ahead of the current cycle
    #[arg(long, env = "MAX_HORIZON", default_value_t = DEFAULT_MAX_HORIZON)]
    pub max_horizon: u64,

    /// Decode every event before matching it against the pool operator
    #[arg(long, env = "STRICT_MATCH", default_value = "false")]
    pub strict_match: bool,

    /// Report format
    #[arg(long, env = "OUTPUT", value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Replay a saved snapshot (cycle info plus newest-first events) instead
    /// of querying the API
    #[arg(long, env = "SNAPSHOT")]
    pub snapshot: Option<PathBuf>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_operator.trim().is_empty() {
            return Err("POOL_OPERATOR must not be empty".to_string());
        }

        if self.page_size == 0 {
            return Err("PAGE_SIZE must be greater than zero".to_string());
        }

        if self.max_horizon == 0 {
            return Err("MAX_HORIZON must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Effective API base URL
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.network.api_base_url())
    }

    pub fn match_mode(&self) -> MatchMode {
        if self.strict_match {
            MatchMode::Strict
        } else {
            MatchMode::Prefilter
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            pool_operator: self.pool_operator.trim().to_string(),
            network: self.network,
            page_size: self.page_size,
            max_horizon: self.max_horizon,
            match_mode: self.match_mode(),
        }
    }

    pub fn hiro_config(&self) -> HiroConfig {
        HiroConfig {
            base_url: self.api_url().trim_end_matches('/').to_string(),
            contract_id: self.network.pox_contract().to_string(),
            timeout_secs: self.request_timeout_secs,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_retries: self.max_retries,
        }
    }
}
