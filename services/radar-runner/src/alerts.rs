//! Alert state machine
//!
//! Per symbol: UNARMED until the score reaches the breakout threshold, then
//! ARMED with a trailing reference price. While armed, each move of at least
//! `move_threshold_pct` from the reference fires a follow-up and moves the
//! reference. Only [`AlertStore::reset`] returns symbols to UNARMED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::AlertPolicy;
use crate::journal::RunLog;
use crate::types::{AlertReason, ScoreResult};

/// Absorbs rounding when a move lands exactly on the threshold
const MOVE_TOLERANCE_PCT: f64 = 1e-9;

/// Alert memory for one symbol
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertState {
    pub last_alert_price: Option<f64>,
    pub last_alert_time: Option<DateTime<Utc>>,
}

/// Where a symbol sits in the alert lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertPhase {
    Unarmed,
    Armed { reference_price: f64 },
}

impl AlertState {
    pub fn phase(&self) -> AlertPhase {
        match self.last_alert_price {
            Some(reference_price) => AlertPhase::Armed { reference_price },
            None => AlertPhase::Unarmed,
        }
    }
}

/// Symbol -> alert state, owned by the evaluation loop
#[derive(Debug, Clone, Default)]
pub struct AlertStore {
    states: HashMap<String, AlertState>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&AlertState> {
        self.states.get(symbol)
    }

    pub fn phase(&self, symbol: &str) -> AlertPhase {
        self.states
            .get(symbol)
            .map(AlertState::phase)
            .unwrap_or(AlertPhase::Unarmed)
    }

    /// Number of armed symbols
    pub fn armed_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s.phase(), AlertPhase::Armed { .. }))
            .count()
    }

    /// Operator reset: every symbol goes back to UNARMED
    pub fn reset(&mut self) {
        let cleared = self.states.len();
        self.states.clear();
        info!("Alert state reset ({} symbols cleared)", cleared);
    }

    fn record(&mut self, symbol: &str, price: f64, at: DateTime<Utc>) {
        let state = self.states.entry(symbol.to_string()).or_default();
        state.last_alert_price = Some(price);
        state.last_alert_time = Some(at);
    }
}

/// A fired alert, ready for the notification transport
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub price: f64,
    pub score: f64,
    pub reason: AlertReason,
    /// Reference price the move was measured against (follow-ups only)
    pub previous_reference: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Percent change from the previous reference, for follow-ups
    pub fn change_pct(&self) -> Option<f64> {
        self.previous_reference
            .map(|reference| (self.price - reference) / reference * 100.0)
    }

    /// Chat message text
    pub fn message(&self) -> String {
        match (self.reason, self.previous_reference, self.change_pct()) {
            (AlertReason::Move, Some(reference), Some(change)) => format!(
                "📈 MOVE {} @ {:.2} ({:+.2}% vs {:.2}) | score {:.1}",
                self.symbol, self.price, change, reference, self.score
            ),
            _ => format!(
                "🚀 BREAKOUT {} @ {:.2} | score {:.1}",
                self.symbol, self.price, self.score
            ),
        }
    }
}

/// Decides whether a score row fires an alert
#[derive(Debug, Clone, Copy)]
pub struct AlertMachine {
    policy: AlertPolicy,
}

impl AlertMachine {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Evaluate one symbol for this cycle.
    ///
    /// On a fired alert the store and the run log are both updated before
    /// returning; delivery of the returned alert does not affect either.
    pub fn evaluate(
        &self,
        store: &mut AlertStore,
        log: &mut RunLog,
        result: &ScoreResult,
    ) -> Option<Alert> {
        let (reason, previous_reference) = match store.phase(&result.symbol) {
            AlertPhase::Unarmed => {
                if result.score < self.policy.breakout_threshold {
                    return None;
                }
                (AlertReason::Breakout, None)
            }
            AlertPhase::Armed { reference_price } => {
                let moved_pct = ((result.price - reference_price) / reference_price * 100.0).abs();
                if moved_pct + MOVE_TOLERANCE_PCT < self.policy.move_threshold_pct {
                    debug!(
                        "{}: {:.2}% from reference {:.2}, no alert",
                        result.symbol, moved_pct, reference_price
                    );
                    return None;
                }
                (AlertReason::Move, Some(reference_price))
            }
        };

        let alert = Alert {
            symbol: result.symbol.clone(),
            price: result.price,
            score: result.score,
            reason,
            previous_reference,
            timestamp: result.timestamp,
        };

        store.record(&alert.symbol, alert.price, alert.timestamp);
        log.append(&alert);

        info!(
            symbol = %alert.symbol,
            reason = %alert.reason,
            price = alert.price,
            score = alert.score,
            "ALERT"
        );

        Some(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorSet, StatusLabel};

    fn row(symbol: &str, price: f64, score: f64) -> ScoreResult {
        ScoreResult {
            symbol: symbol.to_string(),
            price,
            score,
            status: StatusLabel::Idle,
            indicators: IndicatorSet {
                momentum_pct: 0.0,
                relative_volume: 1.0,
                rsi: 50.0,
                daily_change_pct: 0.0,
            },
            timestamp: Utc::now(),
        }
    }

    fn machine() -> AlertMachine {
        AlertMachine::new(AlertPolicy {
            breakout_threshold: 80.0,
            move_threshold_pct: 5.0,
        })
    }

    #[test]
    fn test_unarmed_below_threshold_stays_silent() {
        let (mut store, mut log) = (AlertStore::new(), RunLog::new());
        assert!(machine().evaluate(&mut store, &mut log, &row("X", 10.0, 79.9)).is_none());
        assert_eq!(store.phase("X"), AlertPhase::Unarmed);
        assert!(log.is_empty());
    }

    #[test]
    fn test_first_breakout_arms_symbol() {
        let (mut store, mut log) = (AlertStore::new(), RunLog::new());
        let alert = machine()
            .evaluate(&mut store, &mut log, &row("X", 10.0, 80.0))
            .unwrap();

        assert_eq!(alert.reason, AlertReason::Breakout);
        assert_eq!(store.phase("X"), AlertPhase::Armed { reference_price: 10.0 });
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].reason, AlertReason::Breakout);
        assert_eq!(log.entries()[0].price_at_alert, 10.0);
        assert!(store.get("X").unwrap().last_alert_time.is_some());
    }

    #[test]
    fn test_follow_up_at_exact_threshold_both_directions() {
        for factor in [1.05, 0.95] {
            let (mut store, mut log) = (AlertStore::new(), RunLog::new());
            let m = machine();
            m.evaluate(&mut store, &mut log, &row("X", 40.0, 90.0)).unwrap();

            let price = 40.0 * factor;
            let alert = m.evaluate(&mut store, &mut log, &row("X", price, 10.0)).unwrap();
            assert_eq!(alert.reason, AlertReason::Move);
            assert_eq!(alert.previous_reference, Some(40.0));
            assert_eq!(store.phase("X"), AlertPhase::Armed { reference_price: price });
            assert_eq!(log.len(), 2);
        }
    }

    #[test]
    fn test_small_move_does_not_fire() {
        let (mut store, mut log) = (AlertStore::new(), RunLog::new());
        let m = machine();
        m.evaluate(&mut store, &mut log, &row("X", 40.0, 90.0)).unwrap();

        assert!(m.evaluate(&mut store, &mut log, &row("X", 40.0 * 1.049, 99.0)).is_none());
        assert_eq!(store.phase("X"), AlertPhase::Armed { reference_price: 40.0 });
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_unchanged_cycle_is_idempotent() {
        let (mut store, mut log) = (AlertStore::new(), RunLog::new());
        let m = machine();
        let r = row("X", 12.0, 95.0);
        m.evaluate(&mut store, &mut log, &r).unwrap();

        for _ in 0..3 {
            assert!(m.evaluate(&mut store, &mut log, &r).is_none());
        }
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_trailing_reference_scenario() {
        let (mut store, mut log) = (AlertStore::new(), RunLog::new());
        let m = machine();

        let first = m.evaluate(&mut store, &mut log, &row("X", 10.0, 85.0)).unwrap();
        assert_eq!(first.reason, AlertReason::Breakout);

        let second = m.evaluate(&mut store, &mut log, &row("X", 10.60, 50.0)).unwrap();
        assert_eq!(second.reason, AlertReason::Move);
        assert_eq!(store.phase("X"), AlertPhase::Armed { reference_price: 10.60 });

        assert!(m.evaluate(&mut store, &mut log, &row("X", 10.90, 50.0)).is_none());

        let reasons: Vec<_> = log.entries().iter().map(|e| e.reason).collect();
        assert_eq!(reasons, vec![AlertReason::Breakout, AlertReason::Move]);
    }

    #[test]
    fn test_reset_disarms_all_symbols() {
        let (mut store, mut log) = (AlertStore::new(), RunLog::new());
        let m = machine();
        m.evaluate(&mut store, &mut log, &row("X", 10.0, 85.0)).unwrap();
        m.evaluate(&mut store, &mut log, &row("Y", 20.0, 85.0)).unwrap();
        assert_eq!(store.armed_count(), 2);

        store.reset();
        assert_eq!(store.armed_count(), 0);
        assert_eq!(store.phase("X"), AlertPhase::Unarmed);

        // re-arms as a fresh breakout
        let again = m.evaluate(&mut store, &mut log, &row("X", 10.0, 85.0)).unwrap();
        assert_eq!(again.reason, AlertReason::Breakout);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_messages() {
        let breakout = Alert {
            symbol: "NVDA".to_string(),
            price: 912.346,
            score: 88.04,
            reason: AlertReason::Breakout,
            previous_reference: None,
            timestamp: Utc::now(),
        };
        assert_eq!(breakout.message(), "🚀 BREAKOUT NVDA @ 912.35 | score 88.0");

        let follow_up = Alert {
            price: 10.6,
            previous_reference: Some(10.0),
            reason: AlertReason::Move,
            symbol: "X".to_string(),
            score: 50.0,
            ..breakout
        };
        assert_eq!(follow_up.message(), "📈 MOVE X @ 10.60 (+6.00% vs 10.00) | score 50.0");
    }
}
