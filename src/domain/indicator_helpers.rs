//! Shared helper functions for indicator calculations.

use crate::domain::ohlcv::Candle;
use serde::Serialize;

/// True range per candle. The first candle has no previous close, so its
/// true range is its own high - low.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            if i == 0 {
                candle.range()
            } else {
                candle.true_range(candles[i - 1].close)
            }
        })
        .collect()
}

/// Wilder smoothing: seed with the mean of the first `period` values, then
/// avg = (prev * (n-1) + x) / n. Output is `len - period + 1` long.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut avg = values[..period].iter().sum::<f64>() / period as f64;
    out.push(avg);
    for &v in &values[period..] {
        avg = (avg * (period - 1) as f64 + v) / period as f64;
        out.push(avg);
    }
    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N).
pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn highest(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(f64::NEG_INFINITY, f64::max)
}

pub fn lowest(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(f64::INFINITY, f64::min)
}

/// Percentage change between consecutive values, in percent.
/// A zero base produces 0.0 rather than infinity.
pub fn pct_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                0.0
            } else {
                (w[1] - w[0]) / w[0] * 100.0
            }
        })
        .collect()
}

/// Percentage distance of `level` from `price`, relative to price.
pub fn pct_distance(price: f64, level: f64) -> f64 {
    if price == 0.0 {
        return 0.0;
    }
    (level - price).abs() / price * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
}

/// Swing highs: candles whose high is strictly greater than the highs of
/// `strength` neighbours on each side.
pub fn swing_highs(candles: &[Candle], strength: usize) -> Vec<SwingPoint> {
    swings(candles, strength, |c| c.high, |a, b| a > b)
}

/// Swing lows: candles whose low is strictly lower than the lows of
/// `strength` neighbours on each side.
pub fn swing_lows(candles: &[Candle], strength: usize) -> Vec<SwingPoint> {
    swings(candles, strength, |c| c.low, |a, b| a < b)
}

fn swings(
    candles: &[Candle],
    strength: usize,
    price: impl Fn(&Candle) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Vec<SwingPoint> {
    if strength == 0 || candles.len() < 2 * strength + 1 {
        return Vec::new();
    }

    (strength..candles.len() - strength)
        .filter(|&i| {
            let p = price(&candles[i]);
            (1..=strength)
                .all(|k| beats(p, price(&candles[i - k])) && beats(p, price(&candles[i + k])))
        })
        .map(|index| SwingPoint {
            index,
            price: price(&candles[index]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::make_hlc;

    #[test]
    fn true_range_first_candle_is_range() {
        let candles = make_hlc(&[(110.0, 100.0, 105.0), (115.0, 105.0, 110.0)]);
        let tr = true_ranges(&candles);
        assert_eq!(tr.len(), 2);
        assert!((tr[0] - 10.0).abs() < 1e-9);
        assert!((tr[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn true_range_handles_gaps() {
        let candles = make_hlc(&[(110.0, 100.0, 105.0), (130.0, 120.0, 125.0)]);
        let tr = true_ranges(&candles);
        // |130 - 105| = 25
        assert!((tr[1] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn wilder_smooth_seed_and_step() {
        let out = wilder_smooth(&[10.0, 10.0, 10.0, 16.0], 3);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 10.0).abs() < 1e-9);
        assert!((out[1] - 12.0).abs() < 1e-9);
    }

    #[test]
    fn wilder_smooth_short_input_is_empty() {
        assert!(wilder_smooth(&[1.0, 2.0], 3).is_empty());
        assert!(wilder_smooth(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn stddev_of_constant_is_zero() {
        assert_eq!(population_stddev(&[5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(population_stddev(&[]), None);
    }

    #[test]
    fn pct_changes_guard_zero_base() {
        let changes = pct_changes(&[0.0, 10.0, 11.0]);
        assert_eq!(changes[0], 0.0);
        assert!((changes[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn swing_high_requires_strictly_higher() {
        let candles = make_hlc(&[
            (10.0, 9.0, 9.5),
            (11.0, 10.0, 10.5),
            (13.0, 12.0, 12.5),
            (11.0, 10.0, 10.5),
            (10.0, 9.0, 9.5),
            (13.0, 12.0, 12.5),
            (12.0, 11.0, 11.5),
        ]);
        let highs = swing_highs(&candles, 2);
        assert_eq!(highs.len(), 1);
        assert_eq!(highs[0].index, 2);
        assert!((highs[0].price - 13.0).abs() < 1e-9);
    }

    #[test]
    fn equal_neighbours_are_not_swings() {
        let candles = make_hlc(&[
            (10.0, 9.0, 9.5),
            (12.0, 10.0, 10.5),
            (12.0, 11.0, 11.5),
            (11.0, 10.0, 10.5),
            (10.0, 9.0, 9.5),
        ]);
        assert!(swing_highs(&candles, 2).is_empty());
    }

    #[test]
    fn swing_low_detected() {
        let candles = make_hlc(&[
            (12.0, 10.0, 11.0),
            (11.0, 9.0, 10.0),
            (10.0, 7.0, 8.0),
            (11.0, 9.0, 10.0),
            (12.0, 10.0, 11.0),
        ]);
        let lows = swing_lows(&candles, 2);
        assert_eq!(lows.len(), 1);
        assert_eq!(lows[0].index, 2);
    }
}
