//! Radar Runner Library
//!
//! Stock momentum radar: scores a ticker basket every polling cycle and
//! sends deduplicated breakout and move alerts.

pub mod alerts;
pub mod config;
pub mod error;
pub mod indicators;
pub mod journal;
pub mod notifier;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod source;
pub mod types;


// Re-export main types for convenience
pub use alerts::{Alert, AlertMachine, AlertPhase, AlertState, AlertStore};
pub use config::{AlertPolicy, IndicatorConfig, RadarConfig, ScoringConfig, TelegramConfig};
pub use error::{ConfigError, RadarError};
pub use journal::{RunLog, RunSummary};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use report::ReportWriter;
pub use runner::{CycleReport, RadarRunner};
pub use scoring::Scorer;
pub use source::{BarSource, HttpBarSource};
pub use types::{
    AlertReason, Bar, BarSeries, IndicatorSet, LogEntry, RawBar, ScoreResult, StatusLabel,
    TimeFrame,
};
