//! Indicator calculator
//!
//! Turns a cleaned bar series into momentum, relative volume, RSI and daily
//! change. All functions are pure; degenerate inputs resolve to fallback
//! values instead of errors.

use crate::config::IndicatorConfig;
use crate::error::RadarError;
use crate::types::{Bar, BarSeries, IndicatorSet, RawBar};
use tracing::debug;

/// Stand-in for a zero average loss in the RSI ratio
pub const RSI_LOSS_EPSILON: f64 = 1e-3;

/// Relative volume reported when the mean volume is zero
pub const NEUTRAL_RELATIVE_VOLUME: f64 = 1.0;

/// Drop incomplete bars and order the rest chronologically
pub fn clean_bars(symbol: &str, raw: &[RawBar]) -> Result<BarSeries, RadarError> {
    let mut bars: Vec<Bar> = raw.iter().filter_map(Bar::from_raw).collect();

    let dropped = raw.len() - bars.len();
    if dropped > 0 {
        debug!("{}: dropped {} incomplete bars", symbol, dropped);
    }

    if bars.is_empty() {
        return Err(RadarError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    bars.sort_by_key(|b| b.timestamp);

    Ok(BarSeries {
        symbol: symbol.to_string(),
        bars,
    })
}

/// Minimum number of bars the configured windows need
pub fn required_bars(config: &IndicatorConfig) -> usize {
    (config.momentum_window + 1).max(config.rsi_window + 1)
}

/// Percentage change between the last close and the close `window` bars earlier
pub fn momentum_pct(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window + 1 {
        return None;
    }

    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - window];
    if base <= 0.0 {
        return None;
    }

    Some((last - base) / base * 100.0)
}

/// Last volume divided by the mean volume of the slice
pub fn relative_volume(volumes: &[f64]) -> f64 {
    let Some(&last) = volumes.last() else {
        return NEUTRAL_RELATIVE_VOLUME;
    };

    let mean = volumes.iter().sum::<f64>() / volumes.len() as f64;
    if mean == 0.0 || !mean.is_finite() {
        return NEUTRAL_RELATIVE_VOLUME;
    }

    last / mean
}

/// Relative strength index over the last `period` close-to-close deltas
///
/// RSI = 100 - (100 / (1 + RS)), RS = average gain / average loss.
/// A zero average loss is replaced by [`RSI_LOSS_EPSILON`].
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in (closes.len() - period)..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        avg_loss = RSI_LOSS_EPSILON;
    }

    let rs = avg_gain / avg_loss;
    let value = 100.0 - (100.0 / (1.0 + rs));

    Some(value.clamp(0.0, 100.0))
}

/// Change from the session open to the last close, in percent.
///
/// The session is the UTC trading date of the last bar; `bars` must be in
/// chronological order.
pub fn daily_change_pct(bars: &[Bar]) -> Option<f64> {
    let last = bars.last()?;
    let session = last.timestamp.date_naive();
    let first = bars
        .iter()
        .find(|bar| bar.timestamp.date_naive() == session)?;
    if first.open <= 0.0 {
        return None;
    }

    Some((last.close - first.open) / first.open * 100.0)
}

/// Compute the full indicator set for one symbol
pub fn compute_indicators(
    series: &BarSeries,
    config: &IndicatorConfig,
) -> Result<IndicatorSet, RadarError> {
    let required = required_bars(config);
    if series.len() < required {
        return Err(RadarError::InsufficientData {
            symbol: series.symbol.clone(),
            required,
            available: series.len(),
        });
    }

    let insufficient = || RadarError::InsufficientData {
        symbol: series.symbol.clone(),
        required,
        available: series.len(),
    };

    let closes = series.closes();
    let momentum_pct = momentum_pct(&closes, config.momentum_window).ok_or_else(insufficient)?;
    let rsi = rsi(&closes, config.rsi_window).ok_or_else(insufficient)?;
    let daily_change_pct = daily_change_pct(&series.bars).ok_or_else(insufficient)?;

    let volumes: Vec<f64> = series.bars.iter().map(|b| b.volume).collect();
    let volume_slice = match config.volume_window {
        Some(window) if window > 0 && window < volumes.len() => {
            &volumes[volumes.len() - window..]
        }
        _ => &volumes[..],
    };
    let relative_volume = relative_volume(volume_slice);

    Ok(IndicatorSet {
        momentum_pct,
        relative_volume,
        rsi,
        daily_change_pct,
    })
}
