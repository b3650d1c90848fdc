//! Williams %R.
//!
//! %R = (highest high - close) / (highest high - lowest low) × -100, in
//! [-100, 0]; -50 when the range is zero. Output length: len - n + 1.

use crate::domain::indicator_helpers::{highest, lowest};
use crate::domain::ohlcv::Candle;

pub const DEFAULT_PERIOD: usize = 14;

pub fn williams_r(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }
    candles
        .windows(period)
        .map(|window| {
            let hh = highest(window.iter().map(|c| c.high));
            let ll = lowest(window.iter().map(|c| c.low));
            let close = window[period - 1].close;
            if hh == ll {
                -50.0
            } else {
                (hh - close) / (hh - ll) * -100.0
            }
        })
        .collect()
}
