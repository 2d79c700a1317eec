//! Radar Runner - stock momentum radar
//!
//! 1. Loads configuration (file + environment)
//! 2. Polls the candle service for every symbol on an interval
//! 3. Scores each symbol and sends deduplicated alerts
//! 4. On ctrl-c sends a closing summary and writes the history report

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use radar_runner::{
    BarSource, HttpBarSource, LogNotifier, Notifier, RadarConfig, RadarRunner, TelegramNotifier,
};

/// Radar runner entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting Radar Runner...");

    let config = match RadarConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!(
        "Symbols: {}, Data source: {}, Timeframe: {}",
        config.symbols.join(","),
        config.data_source_url,
        config.timeframe.as_str()
    );

    let source: Arc<dyn BarSource> = Arc::new(HttpBarSource::new(
        &config.data_source_url,
        Duration::from_secs(config.fetch_timeout_secs),
    )?);

    let notifier: Arc<dyn Notifier> = match config.telegram.clone() {
        Some(telegram) => Arc::new(TelegramNotifier::new(
            telegram,
            Duration::from_secs(config.notify_timeout_secs),
        )?),
        None => {
            info!("No Telegram chat configured, alerts go to the log");
            Arc::new(LogNotifier)
        }
    };

    let runner = RadarRunner::new(config, source, notifier);
    runner.run().await
}
