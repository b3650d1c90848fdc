//! CCI (Commodity Channel Index).
//!
//! CCI = (TP - SMA(TP, n)) / (0.015 × mean deviation); 0 when the mean
//! deviation is 0. Output length: len - n + 1.

use crate::domain::ohlcv::Candle;

pub const DEFAULT_PERIOD: usize = 20;
const LAMBERT_CONSTANT: f64 = 0.015;

pub fn cci(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }

    let tp: Vec<f64> = candles.iter().map(Candle::typical_price).collect();
    tp.windows(period)
        .map(|window| {
            let mean = window.iter().sum::<f64>() / period as f64;
            let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
            let current = window[period - 1];
            if mean_dev == 0.0 {
                0.0
            } else {
                (current - mean) / (LAMBERT_CONSTANT * mean_dev)
            }
        })
        .collect()
}
