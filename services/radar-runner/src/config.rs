//! Radar Configuration
//!
//! Layered: built-in defaults, then an optional config file, then
//! `RADAR__*` environment variables (`__` separates nested keys), then the
//! plain environment overrides listed on [`RadarConfig::load`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::error::ConfigError;
use crate::types::TimeFrame;

const DEFAULT_REPORT_DIR: &str = ".stock-radar";
const DEFAULT_CONFIG_FILE: &str = "radar.toml";

/// Top-level radar configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RadarConfig {
    /// Ticker basket polled every cycle
    pub symbols: Vec<String>,
    /// Base URL of the candle service
    pub data_source_url: String,
    pub timeframe: TimeFrame,
    /// Number of bars requested per symbol
    pub lookback_bars: usize,
    pub poll_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub indicators: IndicatorConfig,
    pub scoring: ScoringConfig,
    pub alerts: AlertPolicy,
    pub telegram: Option<TelegramConfig>,
    /// Where scoreboard and history reports are written
    pub report_dir: PathBuf,
    /// Send the closing summary and write the history report on shutdown
    pub summary_on_shutdown: bool,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            data_source_url: "http://localhost:8080".to_string(),
            timeframe: TimeFrame::Minute5,
            lookback_bars: 60,
            poll_interval_secs: 60,
            fetch_timeout_secs: 10,
            notify_timeout_secs: 10,
            indicators: IndicatorConfig::default(),
            scoring: ScoringConfig::default(),
            alerts: AlertPolicy::default(),
            telegram: None,
            report_dir: default_report_dir(),
            summary_on_shutdown: true,
        }
    }
}

fn default_symbols() -> Vec<String> {
    ["AAPL", "MSFT", "NVDA", "TSLA", "AMD"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_report_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_REPORT_DIR)
}

impl RadarConfig {
    /// Load and validate configuration.
    ///
    /// Reads from environment:
    /// - `RADAR_CONFIG` - config file path (default: radar.toml, optional)
    /// - `RADAR__<SECTION>__<KEY>` - any nested value
    /// - `RADAR_SYMBOLS` - comma-separated symbol list
    /// - `DATA_SOURCE_URL` - candle service base URL
    /// - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` - chat credentials
    /// - `RADAR_REPORT_DIR` - report directory (default: ~/.stock-radar)
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("RADAR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config: RadarConfig = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("RADAR")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.apply_env_overrides();
        config.validate()?;

        info!(
            "Config loaded: {} symbols, {} bars @ {}, poll every {}s",
            config.symbols.len(),
            config.lookback_bars,
            config.timeframe.as_str(),
            config.poll_interval_secs
        );

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(symbols) = std::env::var("RADAR_SYMBOLS") {
            self.symbols = parse_symbols(&symbols);
        }

        if let Ok(url) = std::env::var("DATA_SOURCE_URL") {
            self.data_source_url = url;
        }

        if let Ok(dir) = std::env::var("RADAR_REPORT_DIR") {
            self.report_dir = PathBuf::from(dir);
        }

        let token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok();
        if let (Some(bot_token), Some(chat_id)) = (token, chat_id) {
            self.telegram = Some(TelegramConfig {
                bot_token,
                chat_id,
                ..self.telegram.clone().unwrap_or_default()
            });
        }
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::invalid("symbols", "at least one symbol is required"));
        }
        if self.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::invalid("symbols", "symbols must not be blank"));
        }
        if self.data_source_url.trim().is_empty() {
            return Err(ConfigError::invalid("data_source_url", "must not be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::invalid("poll_interval_secs", "must be greater than 0"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::invalid("fetch_timeout_secs", "must be greater than 0"));
        }
        if self.notify_timeout_secs == 0 {
            return Err(ConfigError::invalid("notify_timeout_secs", "must be greater than 0"));
        }

        self.indicators.validate()?;

        let required = crate::indicators::required_bars(&self.indicators);
        if self.lookback_bars < required {
            return Err(ConfigError::invalid(
                "lookback_bars",
                format!(
                    "{} bars cannot cover the indicator windows (need {})",
                    self.lookback_bars, required
                ),
            ));
        }

        self.scoring.validate()?;
        self.alerts.validate()?;

        let (floor, ceiling) = (self.scoring.floor, self.scoring.ceiling);
        if !(floor..=ceiling).contains(&self.alerts.breakout_threshold) {
            return Err(ConfigError::invalid(
                "alerts.breakout_threshold",
                format!(
                    "{} is outside the score range {}..={} and can never fire",
                    self.alerts.breakout_threshold, floor, ceiling
                ),
            ));
        }

        if let Some(ref telegram) = self.telegram {
            if telegram.bot_token.is_empty() || telegram.chat_id.is_empty() {
                return Err(ConfigError::invalid(
                    "telegram",
                    "bot_token and chat_id are both required",
                ));
            }
        }

        Ok(())
    }
}

/// Split a comma-separated symbol list, normalising to upper case
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Look-back windows for the indicator calculator
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct IndicatorConfig {
    #[serde(default = "default_momentum_window")]
    pub momentum_window: usize,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    /// Bars used for the mean volume; `None` uses the whole series
    #[serde(default)]
    pub volume_window: Option<usize>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            momentum_window: default_momentum_window(),
            rsi_window: default_rsi_window(),
            volume_window: None,
        }
    }
}

impl IndicatorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.momentum_window == 0 {
            return Err(ConfigError::invalid(
                "indicators.momentum_window",
                "must be greater than 0",
            ));
        }
        if self.rsi_window == 0 {
            return Err(ConfigError::invalid("indicators.rsi_window", "must be greater than 0"));
        }
        if self.volume_window == Some(0) {
            return Err(ConfigError::invalid("indicators.volume_window", "must be greater than 0"));
        }
        Ok(())
    }
}

fn default_momentum_window() -> usize { 15 }
fn default_rsi_window() -> usize { 14 }

/// Weights and bounds for the composite score
///
/// Formula variants are expressed by changing these values, e.g.
/// `ScoringConfig::default().with_weights(50.0, 30.0).with_rising_bonus(0.0)`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct ScoringConfig {
    #[serde(default = "default_momentum_weight")]
    pub momentum_weight: f64,
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,
    /// Added when the session is up and RSI is not overbought
    #[serde(default = "default_rising_bonus")]
    pub rising_bonus: f64,
    /// Subtracted when RSI is above `overbought_rsi`
    #[serde(default = "default_overbought_penalty")]
    pub overbought_penalty: f64,
    #[serde(default = "default_overbought_rsi")]
    pub overbought_rsi: f64,
    #[serde(default = "default_score_floor")]
    pub floor: f64,
    #[serde(default = "default_score_ceiling")]
    pub ceiling: f64,
    /// Scores strictly above this are labelled breakout
    #[serde(default = "default_breakout_above")]
    pub breakout_above: f64,
    /// Scores strictly above this are labelled watch
    #[serde(default = "default_watch_above")]
    pub watch_above: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            momentum_weight: default_momentum_weight(),
            volume_weight: default_volume_weight(),
            rising_bonus: default_rising_bonus(),
            overbought_penalty: default_overbought_penalty(),
            overbought_rsi: default_overbought_rsi(),
            floor: default_score_floor(),
            ceiling: default_score_ceiling(),
            breakout_above: default_breakout_above(),
            watch_above: default_watch_above(),
        }
    }
}

impl ScoringConfig {
    pub fn with_weights(mut self, momentum_weight: f64, volume_weight: f64) -> Self {
        self.momentum_weight = momentum_weight;
        self.volume_weight = volume_weight;
        self
    }

    pub fn with_rising_bonus(mut self, bonus: f64) -> Self {
        self.rising_bonus = bonus;
        self
    }

    pub fn with_overbought(mut self, rsi_threshold: f64, penalty: f64) -> Self {
        self.overbought_rsi = rsi_threshold;
        self.overbought_penalty = penalty;
        self
    }

    pub fn with_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor = floor;
        self.ceiling = ceiling;
        self
    }

    pub fn with_tiers(mut self, watch_above: f64, breakout_above: f64) -> Self {
        self.watch_above = watch_above;
        self.breakout_above = breakout_above;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("scoring.momentum_weight", self.momentum_weight),
            ("scoring.volume_weight", self.volume_weight),
            ("scoring.rising_bonus", self.rising_bonus),
            ("scoring.overbought_penalty", self.overbought_penalty),
            ("scoring.overbought_rsi", self.overbought_rsi),
            ("scoring.floor", self.floor),
            ("scoring.ceiling", self.ceiling),
            ("scoring.breakout_above", self.breakout_above),
            ("scoring.watch_above", self.watch_above),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be a finite number"));
            }
        }

        if self.floor >= self.ceiling {
            return Err(ConfigError::invalid(
                "scoring.floor",
                format!("floor {} must be below ceiling {}", self.floor, self.ceiling),
            ));
        }
        if self.rising_bonus < 0.0 {
            return Err(ConfigError::invalid("scoring.rising_bonus", "must not be negative"));
        }
        if self.overbought_penalty < 0.0 {
            return Err(ConfigError::invalid("scoring.overbought_penalty", "must not be negative"));
        }
        if !(0.0..=100.0).contains(&self.overbought_rsi) {
            return Err(ConfigError::invalid("scoring.overbought_rsi", "must be within 0..=100"));
        }
        if self.watch_above > self.breakout_above {
            return Err(ConfigError::invalid(
                "scoring.watch_above",
                "watch tier must not be above the breakout tier",
            ));
        }
        Ok(())
    }
}

fn default_momentum_weight() -> f64 { 5.0 }
fn default_volume_weight() -> f64 { 10.0 }
fn default_rising_bonus() -> f64 { 10.0 }
fn default_overbought_penalty() -> f64 { 15.0 }
fn default_overbought_rsi() -> f64 { 75.0 }
fn default_score_floor() -> f64 { 0.0 }
fn default_score_ceiling() -> f64 { 99.9 }
fn default_breakout_above() -> f64 { 80.0 }
fn default_watch_above() -> f64 { 60.0 }

/// When alerts fire
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct AlertPolicy {
    /// Score that arms a symbol and fires its first alert
    #[serde(default = "default_breakout_threshold")]
    pub breakout_threshold: f64,
    /// Percent move from the reference price that re-triggers an armed symbol
    #[serde(default = "default_move_threshold_pct")]
    pub move_threshold_pct: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            breakout_threshold: default_breakout_threshold(),
            move_threshold_pct: default_move_threshold_pct(),
        }
    }
}

impl AlertPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.breakout_threshold.is_finite() {
            return Err(ConfigError::invalid(
                "alerts.breakout_threshold",
                "must be a finite number",
            ));
        }
        if !self.move_threshold_pct.is_finite() || self.move_threshold_pct <= 0.0 {
            return Err(ConfigError::invalid(
                "alerts.move_threshold_pct",
                "must be a positive percentage",
            ));
        }
        Ok(())
    }
}

fn default_breakout_threshold() -> f64 { 80.0 }
fn default_move_threshold_pct() -> f64 { 5.0 }

/// Telegram chat credentials
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_api_base(),
        }
    }
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}
