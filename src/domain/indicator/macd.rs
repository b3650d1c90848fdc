//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow), aligned on the later-starting slow EMA
//! Signal Line = EMA(signal) of the MACD line
//! Histogram = MACD Line - Signal Line
//!
//! Output is aligned on the signal line: length len - slow - signal + 2.

use crate::domain::indicator::ema;
use serde::Serialize;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Vec<MacdPoint> {
    if fast == 0 || signal_period == 0 || fast >= slow {
        return Vec::new();
    }

    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    if ema_slow.is_empty() {
        return Vec::new();
    }

    // ema_fast starts (slow - fast) values before ema_slow
    let offset = slow - fast;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow_v)| ema_fast[i + offset] - slow_v)
        .collect();

    let signal_line = ema(&macd_line, signal_period);
    let signal_offset = signal_period - 1;

    signal_line
        .iter()
        .enumerate()
        .map(|(i, &signal)| {
            let line = macd_line[i + signal_offset];
            MacdPoint {
                line,
                signal,
                histogram: line - signal,
            }
        })
        .collect()
}

pub fn macd_default(closes: &[f64]) -> Vec<MacdPoint> {
    macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
