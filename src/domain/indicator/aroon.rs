//! Aroon Up/Down.
//!
//! Over a window of n candles:
//! Up   = (n - 1 - bars since highest high) / (n - 1) × 100
//! Down = (n - 1 - bars since lowest low) / (n - 1) × 100
//! Ties resolve to the most recent occurrence. Output length: len - n + 1.

use crate::domain::ohlcv::Candle;
use serde::Serialize;

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AroonPoint {
    pub up: f64,
    pub down: f64,
}

impl AroonPoint {
    pub fn oscillator(&self) -> f64 {
        self.up - self.down
    }
}

pub fn aroon(candles: &[Candle], period: usize) -> Vec<AroonPoint> {
    if period < 2 || candles.len() < period {
        return Vec::new();
    }

    let span = (period - 1) as f64;
    candles
        .windows(period)
        .map(|window| {
            let mut high_idx = 0;
            let mut low_idx = 0;
            for (i, c) in window.iter().enumerate() {
                if c.high >= window[high_idx].high {
                    high_idx = i;
                }
                if c.low <= window[low_idx].low {
                    low_idx = i;
                }
            }
            let since_high = (period - 1 - high_idx) as f64;
            let since_low = (period - 1 - low_idx) as f64;
            AroonPoint {
                up: (span - since_high) / span * 100.0,
                down: (span - since_low) / span * 100.0,
            }
        })
        .collect()
}
