//! Price/indicator divergence.
//!
//! Works on any indicator series aligned to the suffix of `closes`. The
//! lookback window is split into an earlier and a recent half and the
//! extremes of each half are compared:
//! - Bullish: price makes a lower low while the indicator at that low is higher.
//! - Bearish: price makes a higher high while the indicator at that high is lower.
//!
//! When both fire, the one with the larger indicator disagreement wins.

use crate::domain::indicator::Bias;
use serde::Serialize;

pub const DEFAULT_LOOKBACK: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Divergence {
    pub bias: Bias,
    /// Absolute indicator change between the two extremes.
    pub magnitude: f64,
}

fn extreme_index(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut idx = 0;
    for (i, &v) in values.iter().enumerate() {
        // Later occurrences win ties.
        if !better(values[idx], v) {
            idx = i;
        }
    }
    idx
}

pub fn detect_divergence(closes: &[f64], indicator: &[f64], lookback: usize) -> Option<Divergence> {
    if lookback < 4 || indicator.len() < lookback || closes.len() < indicator.len() {
        return None;
    }

    let prices = &closes[closes.len() - lookback..];
    let values = &indicator[indicator.len() - lookback..];
    let half = lookback / 2;
    let (early_p, recent_p) = prices.split_at(half);

    let early_low = extreme_index(early_p, |a, b| a < b);
    let recent_low = half + extreme_index(recent_p, |a, b| a < b);
    let early_high = extreme_index(early_p, |a, b| a > b);
    let recent_high = half + extreme_index(recent_p, |a, b| a > b);

    let bullish = (prices[recent_low] < prices[early_low]
        && values[recent_low] > values[early_low])
        .then(|| values[recent_low] - values[early_low]);
    let bearish = (prices[recent_high] > prices[early_high]
        && values[recent_high] < values[early_high])
        .then(|| values[early_high] - values[recent_high]);

    match (bullish, bearish) {
        (Some(b), Some(s)) if s > b => Some(Divergence {
            bias: Bias::Bearish,
            magnitude: s,
        }),
        (Some(b), _) => Some(Divergence {
            bias: Bias::Bullish,
            magnitude: b,
        }),
        (None, Some(s)) => Some(Divergence {
            bias: Bias::Bearish,
            magnitude: s,
        }),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_divergence_lower_low_higher_indicator() {
        let closes = [100.0, 95.0, 90.0, 96.0, 98.0, 94.0, 88.0, 92.0];
        let rsi = [50.0, 35.0, 25.0, 40.0, 45.0, 38.0, 32.0, 41.0];
        let div = detect_divergence(&closes, &rsi, 8).unwrap();
        assert_eq!(div.bias, Bias::Bullish);
        assert!((div.magnitude - 7.0).abs() < 1e-9);
    }

    #[test]
    fn bearish_divergence_higher_high_lower_indicator() {
        let closes = [100.0, 105.0, 110.0, 104.0, 102.0, 108.0, 112.0, 107.0];
        let rsi = [50.0, 65.0, 78.0, 60.0, 55.0, 66.0, 70.0, 58.0];
        let div = detect_divergence(&closes, &rsi, 8).unwrap();
        assert_eq!(div.bias, Bias::Bearish);
    }

    #[test]
    fn confirmed_move_has_no_divergence() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let indicator: Vec<f64> = (0..10).map(|i| 40.0 + i as f64).collect();
        assert!(detect_divergence(&closes, &indicator, 10).is_none());
    }

    #[test]
    fn indicator_aligned_to_suffix() {
        // Indicator shorter than closes: compared against the last closes.
        let mut closes = vec![500.0; 5];
        closes.extend([100.0, 95.0, 90.0, 96.0, 98.0, 94.0, 88.0, 92.0]);
        let rsi = [50.0, 35.0, 25.0, 40.0, 45.0, 38.0, 32.0, 41.0];
        assert_eq!(detect_divergence(&closes, &rsi, 8).unwrap().bias, Bias::Bullish);
    }

    #[test]
    fn short_input_is_none() {
        assert!(detect_divergence(&[1.0, 2.0], &[1.0, 2.0], 20).is_none());
    }
}
