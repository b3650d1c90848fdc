//! Stochastic oscillator.
//!
//! %K = (close - lowest low) / (highest high - lowest low) × 100 over k
//! candles, 50 when the range is zero. %D = SMA(%K, d).
//! Output is aligned on %D: length len - k - d + 2.

use crate::domain::indicator::sma;
use crate::domain::indicator_helpers::{highest, lowest};
use crate::domain::ohlcv::Candle;
use serde::Serialize;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticPoint {
    pub k: f64,
    pub d: f64,
}

/// Raw %K series, length len - k + 1.
pub fn percent_k(candles: &[Candle], k_period: usize) -> Vec<f64> {
    if k_period == 0 || candles.len() < k_period {
        return Vec::new();
    }
    candles
        .windows(k_period)
        .map(|window| {
            let hh = highest(window.iter().map(|c| c.high));
            let ll = lowest(window.iter().map(|c| c.low));
            let close = window[window.len() - 1].close;
            if hh == ll {
                50.0
            } else {
                (close - ll) / (hh - ll) * 100.0
            }
        })
        .collect()
}

pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> Vec<StochasticPoint> {
    let k_values = percent_k(candles, k_period);
    let d_values = sma(&k_values, d_period);
    let offset = d_period.saturating_sub(1);

    d_values
        .into_iter()
        .enumerate()
        .map(|(i, d)| StochasticPoint {
            k: k_values[i + offset],
            d,
        })
        .collect()
}
