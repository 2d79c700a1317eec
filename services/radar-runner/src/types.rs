//! Core types shared by the scoring and alerting pipeline
//!
//! Bars arrive from the market data collaborator as [`RawBar`]s, get cleaned
//! into a [`BarSeries`], and flow through indicators and scoring into a
//! [`ScoreResult`]. [`LogEntry`] is the only record that outlives a cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bar granularity requested from the market data source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeFrame {
    #[serde(rename = "1m")]
    Minute1,
    #[default]
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    Day1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Minute1 => "1m",
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute15 => "15m",
            TimeFrame::Minute30 => "30m",
            TimeFrame::Hour1 => "1h",
            TimeFrame::Day1 => "1d",
        }
    }
}

/// Bar as delivered by a provider. Any field may be missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawBar {
    pub timestamp: Option<DateTime<Utc>>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// A validated OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Convert a raw bar, rejecting missing or unusable values
    pub fn from_raw(raw: &RawBar) -> Option<Self> {
        let bar = Bar {
            timestamp: raw.timestamp?,
            open: raw.open?,
            high: raw.high?,
            low: raw.low?,
            close: raw.close?,
            volume: raw.volume?,
        };

        let prices_ok = [bar.open, bar.high, bar.low, bar.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0);
        let volume_ok = bar.volume.is_finite() && bar.volume >= 0.0;

        (prices_ok && volume_ok).then_some(bar)
    }
}

/// Chronological bars for one symbol in one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// Indicator values for one symbol, recomputed every cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSet {
    pub momentum_pct: f64,
    pub relative_volume: f64,
    pub rsi: f64,
    pub daily_change_pct: f64,
}

/// Score tier shown next to each symbol
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Idle,
    Watch,
    Breakout,
}

impl StatusLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Idle => "idle",
            StatusLabel::Watch => "watch",
            StatusLabel::Breakout => "breakout",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the score table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub symbol: String,
    pub price: f64,
    pub score: f64,
    pub status: StatusLabel,
    pub indicators: IndicatorSet,
    pub timestamp: DateTime<Utc>,
}

/// Why an alert fired
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    /// First alert for an unarmed symbol
    Breakout,
    /// Follow-up alert after a material move from the reference price
    Move,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::Breakout => "breakout",
            AlertReason::Move => "move",
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run log record, one per fired alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price_at_alert: f64,
    pub score_at_alert: f64,
    pub reason: AlertReason,
}
