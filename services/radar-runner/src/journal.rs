//! Run log - append-only record of fired alerts
//!
//! Mutated only from the evaluation path; readers get clones or slices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::alerts::Alert;
use crate::types::{AlertReason, LogEntry};

#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, alert: &Alert) -> &LogEntry {
        self.entries.push(LogEntry {
            id: uuid::Uuid::new_v4(),
            timestamp: alert.timestamp,
            symbol: alert.symbol.clone(),
            price_at_alert: alert.price,
            score_at_alert: alert.score,
            reason: alert.reason,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the whole history
    pub fn clear(&mut self) {
        let cleared = self.entries.len();
        self.entries.clear();
        info!("Run log cleared ({} entries)", cleared);
    }

    pub fn summary(&self) -> RunSummary {
        let count = |reason| self.entries.iter().filter(|e| e.reason == reason).count();

        let symbols: BTreeSet<&str> = self.entries.iter().map(|e| e.symbol.as_str()).collect();

        let best = self
            .entries
            .iter()
            .max_by(|a, b| a.score_at_alert.total_cmp(&b.score_at_alert))
            .cloned();

        RunSummary {
            total_alerts: self.entries.len(),
            breakouts: count(AlertReason::Breakout),
            moves: count(AlertReason::Move),
            symbols: symbols.into_iter().map(str::to_string).collect(),
            best,
            first_at: self.entries.first().map(|e| e.timestamp),
            last_at: self.entries.last().map(|e| e.timestamp),
        }
    }
}

/// Closing performance summary over the run log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total_alerts: usize,
    pub breakouts: usize,
    pub moves: usize,
    /// Distinct alerted symbols, sorted
    pub symbols: Vec<String>,
    /// Highest-scoring alert
    pub best: Option<LogEntry>,
    pub first_at: Option<DateTime<Utc>>,
    pub last_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// Chat message text
    pub fn to_message(&self) -> String {
        let mut lines = vec![
            "📊 Radar session summary".to_string(),
            format!(
                "Alerts: {} ({} breakout, {} move)",
                self.total_alerts, self.breakouts, self.moves
            ),
        ];

        if !self.symbols.is_empty() {
            lines.push(format!("Symbols: {}", self.symbols.join(", ")));
        }

        if let Some(ref best) = self.best {
            lines.push(format!(
                "Top: {} score {:.1} @ {:.2}",
                best.symbol, best.score_at_alert, best.price_at_alert
            ));
        }

        if let (Some(first), Some(last)) = (self.first_at, self.last_at) {
            lines.push(format!(
                "Window: {} - {} UTC",
                first.format("%H:%M"),
                last.format("%H:%M")
            ));
        }

        lines.join("\n")
    }
}
