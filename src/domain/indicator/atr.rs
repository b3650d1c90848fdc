//! ATR (Average True Range).
//!
//! True range = max(h - l, |h - prevClose|, |l - prevClose|); the first
//! candle uses h - l. Seeded with the SMA of the first n true ranges, then
//! Wilder-smoothed. Output length: len - n + 1.

use crate::domain::indicator_helpers::{true_ranges, wilder_smooth};
use crate::domain::ohlcv::Candle;

pub const DEFAULT_PERIOD: usize = 14;

pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }
    wilder_smooth(&true_ranges(candles), period)
}

/// ATR as a percentage of price.
pub fn atr_percent(atr: f64, price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    atr / price * 100.0
}
