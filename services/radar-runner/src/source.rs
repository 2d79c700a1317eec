//! Market data collaborator
//!
//! The engine only needs a chronological list of bars per symbol. Fetching
//! is behind [`BarSource`] so tests and alternative providers can plug in.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::RadarError;
use crate::types::{RawBar, TimeFrame};

/// Supplies OHLCV bars for one symbol
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch up to `limit` of the most recent bars.
    ///
    /// An empty vector means the provider has no data for the symbol.
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> Result<Vec<RawBar>, RadarError>;

    /// Source name
    fn name(&self) -> &str;
}

/// Client for the candle service (`GET /candles/{symbol}`)
pub struct HttpBarSource {
    client: Client,
    base_url: String,
}

impl HttpBarSource {
    /// Create new candle service client
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BarSource for HttpBarSource {
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> Result<Vec<RawBar>, RadarError> {
        let url = format!("{}/candles/{}", self.base_url, symbol);
        let source_error = |message: String| RadarError::DataSource {
            symbol: symbol.to_string(),
            message,
        };

        debug!("Fetching {} bars for {} from {}", limit, symbol, url);

        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("timeframe", timeframe.as_str()), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| source_error(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => {
                debug!("No candles for {}", symbol);
                Ok(Vec::new())
            }
            status if status.is_success() => response
                .json::<Vec<RawBar>>()
                .await
                .map_err(|e| source_error(format!("invalid candle payload: {}", e))),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(source_error(format!("{} - {}", status, text)))
            }
        }
    }

    fn name(&self) -> &str {
        "candle_service"
    }
}
