//! pox-monitor - stacking pool reconciliation for PoX-4

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pox_monitor::{
    config::{Args, OutputFormat},
    report::{render_json, render_text},
    source::{CycleInfoSource, EventsSource, HiroClient, InMemorySource},
    BitcoinAddressCodec, PoolMonitor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr so stdout only carries the report
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pox_monitor={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Pool operator: {}", args.pool_operator);
    info!("Network: {:?}", args.network);

    let (events, cycles): (Arc<dyn EventsSource>, Arc<dyn CycleInfoSource>) =
        match &args.snapshot {
            Some(path) => {
                info!("Replaying snapshot {}", path.display());
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading snapshot {}", path.display()))?;
                let source = Arc::new(InMemorySource::from_json(&json)?);
                (source.clone(), source)
            }
            None => {
                let hiro = args.hiro_config();
                info!("API: {}", hiro.base_url);
                let client = Arc::new(HiroClient::new(hiro)?);
                (client.clone(), client)
            }
        };

    let monitor = PoolMonitor::new(
        args.monitor_config(),
        events,
        cycles,
        Arc::new(BitcoinAddressCodec),
    );
    let report = monitor.run().await?;

    match args.output {
        OutputFormat::Text => print!("{}", render_text(&report, args.log_entries)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}
