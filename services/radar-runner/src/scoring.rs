//! Composite scorer
//!
//! raw = momentum_pct * momentum_weight
//!     + relative_volume * volume_weight
//!     + rising_bonus        (session up and RSI not overbought)
//!     - overbought_penalty  (RSI above the overbought level)
//!
//! The raw value is clamped into `[floor, ceiling]` and mapped to a tier.

use chrono::{DateTime, Utc};

use crate::config::ScoringConfig;
use crate::types::{IndicatorSet, ScoreResult, StatusLabel};

/// Pure scoring function parameterised by [`ScoringConfig`]
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
    /// Tiers ordered from highest threshold to lowest
    tiers: Vec<(f64, StatusLabel)>,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        let mut tiers = vec![
            (config.breakout_above, StatusLabel::Breakout),
            (config.watch_above, StatusLabel::Watch),
        ];
        tiers.sort_by(|a, b| b.0.total_cmp(&a.0));

        Self { config, tiers }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Unclamped weighted sum
    pub fn raw_score(&self, indicators: &IndicatorSet) -> f64 {
        let c = &self.config;
        let mut raw = indicators.momentum_pct * c.momentum_weight
            + indicators.relative_volume * c.volume_weight;

        let overbought = indicators.rsi > c.overbought_rsi;
        if indicators.daily_change_pct > 0.0 && !overbought {
            raw += c.rising_bonus;
        }
        if overbought {
            raw -= c.overbought_penalty;
        }

        raw
    }

    /// Clamped composite score
    pub fn score(&self, indicators: &IndicatorSet) -> f64 {
        let raw = self.raw_score(indicators);
        if raw.is_nan() {
            return self.config.floor;
        }
        raw.clamp(self.config.floor, self.config.ceiling)
    }

    /// Highest tier whose threshold the score strictly exceeds
    pub fn label(&self, score: f64) -> StatusLabel {
        self.tiers
            .iter()
            .find(|(threshold, _)| score > *threshold)
            .map(|(_, label)| *label)
            .unwrap_or(StatusLabel::Idle)
    }

    /// Build the score table row for one symbol
    pub fn evaluate(
        &self,
        symbol: &str,
        price: f64,
        indicators: IndicatorSet,
        timestamp: DateTime<Utc>,
    ) -> ScoreResult {
        let score = self.score(&indicators);
        ScoreResult {
            symbol: symbol.to_string(),
            price,
            score,
            status: self.label(score),
            indicators,
            timestamp,
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicators(
        momentum_pct: f64,
        relative_volume: f64,
        rsi: f64,
        daily_change_pct: f64,
    ) -> IndicatorSet {
        IndicatorSet {
            momentum_pct,
            relative_volume,
            rsi,
            daily_change_pct,
        }
    }

    #[test]
    fn test_weighted_score_clamped_to_ceiling() {
        let scorer = Scorer::new(
            ScoringConfig::default()
                .with_weights(50.0, 30.0)
                .with_rising_bonus(0.0)
                .with_overbought(75.0, 0.0),
        );
        let set = indicators(10.0, 2.0, 50.0, 1.0);

        assert!((scorer.raw_score(&set) - 560.0).abs() < 1e-9);
        assert_eq!(scorer.score(&set), 99.9);
        assert_eq!(scorer.label(99.9), StatusLabel::Breakout);
    }

    #[test]
    fn test_negative_raw_clamped_to_floor() {
        let scorer = Scorer::default();
        let set = indicators(-40.0, 0.1, 20.0, -8.0);
        assert!(scorer.raw_score(&set) < 0.0);
        assert_eq!(scorer.score(&set), 0.0);
    }

    #[test]
    fn test_extreme_inputs_stay_in_bounds() {
        let scorer = Scorer::default();
        for set in [
            indicators(1e300, 1e300, 100.0, 1e300),
            indicators(-1e300, 0.0, 0.0, -1e300),
            indicators(f64::MAX, f64::MAX, 50.0, 1.0),
            indicators(f64::INFINITY, f64::NEG_INFINITY, 50.0, 1.0),
        ] {
            let score = scorer.score(&set);
            assert!((0.0..=99.9).contains(&score), "score {} out of bounds", score);
        }
    }

    #[test]
    fn test_rising_bonus_only_below_overbought() {
        let scorer = Scorer::new(
            ScoringConfig::default()
                .with_weights(1.0, 0.0)
                .with_rising_bonus(10.0)
                .with_overbought(75.0, 15.0),
        );

        // up session, normal RSI: bonus
        assert!((scorer.raw_score(&indicators(5.0, 1.0, 60.0, 2.0)) - 15.0).abs() < 1e-9);
        // down session: no bonus
        assert!((scorer.raw_score(&indicators(5.0, 1.0, 60.0, -2.0)) - 5.0).abs() < 1e-9);
        // overbought: penalty, no bonus
        assert!((scorer.raw_score(&indicators(5.0, 1.0, 80.0, 2.0)) - (-10.0)).abs() < 1e-9);
        // exactly at the threshold is not overbought
        assert!((scorer.raw_score(&indicators(5.0, 1.0, 75.0, 2.0)) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels_resolve_to_highest_tier() {
        let scorer = Scorer::default();
        assert_eq!(scorer.label(95.0), StatusLabel::Breakout);
        assert_eq!(scorer.label(80.5), StatusLabel::Breakout);
        assert_eq!(scorer.label(80.0), StatusLabel::Watch);
        assert_eq!(scorer.label(61.0), StatusLabel::Watch);
        assert_eq!(scorer.label(60.0), StatusLabel::Idle);
        assert_eq!(scorer.label(0.0), StatusLabel::Idle);
    }

    #[test]
    fn test_evaluate_builds_row() {
        let scorer = Scorer::default();
        let now = Utc::now();
        // 3% * 5 + 2.0 * 10 + 10 bonus = 45
        let row = scorer.evaluate("AAPL", 187.3, indicators(3.0, 2.0, 55.0, 1.2), now);

        assert_eq!(row.symbol, "AAPL");
        assert_eq!(row.price, 187.3);
        assert!((row.score - 45.0).abs() < 1e-9);
        assert_eq!(row.status, StatusLabel::Idle);
        assert_eq!(row.timestamp, now);
    }
}
