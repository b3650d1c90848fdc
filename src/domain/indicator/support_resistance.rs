//! Support and resistance levels.
//!
//! - Swing levels: a swing high (low) is strictly above (below) the two
//!   candles on each side. Support/resistance are the averages of the most
//!   recent three swing lows/highs.
//! - Pivot points (standard floor pivots) from the last candle:
//!   P = (H + L + C) / 3, R1 = 2P - L, S1 = 2P - H, R2 = P + (H - L),
//!   S2 = P - (H - L).
//! - Fibonacci retracements of the window's high/low range at
//!   0.236 / 0.382 / 0.5 / 0.618 / 0.786, measured down from the high.

use crate::domain::indicator_helpers::{SwingPoint, highest, lowest, swing_highs, swing_lows};
use crate::domain::ohlcv::Candle;
use serde::Serialize;

pub const SWING_STRENGTH: usize = 2;
pub const MIN_CANDLES: usize = 2 * SWING_STRENGTH + 1;
pub const RECENT_SWINGS: usize = 3;
pub const FIB_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub s1: f64,
    pub s2: f64,
}

impl PivotLevels {
    pub fn from_candle(candle: &Candle) -> Self {
        let range = candle.range();
        let pivot = candle.typical_price();
        Self {
            pivot,
            r1: 2.0 * pivot - candle.low,
            r2: pivot + range,
            s1: 2.0 * pivot - candle.high,
            s2: pivot - range,
        }
    }

    fn levels(&self) -> [f64; 5] {
        [self.s2, self.s1, self.pivot, self.r1, self.r2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportResistance {
    /// Mean of the last three swing lows; `None` without any swing low.
    pub support: Option<f64>,
    /// Mean of the last three swing highs; `None` without any swing high.
    pub resistance: Option<f64>,
    pub pivots: PivotLevels,
    pub fibonacci: Vec<FibLevel>,
    pub swing_highs: Vec<SwingPoint>,
    pub swing_lows: Vec<SwingPoint>,
}

impl SupportResistance {
    fn all_levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.support
            .into_iter()
            .chain(self.resistance)
            .chain(self.pivots.levels())
            .chain(self.fibonacci.iter().map(|f| f.price))
            .chain(self.swing_highs.iter().map(|s| s.price))
            .chain(self.swing_lows.iter().map(|s| s.price))
    }

    /// Closest level at or below `price`.
    pub fn nearest_support(&self, price: f64) -> Option<f64> {
        self.all_levels()
            .filter(|&level| level <= price)
            .fold(None, |best: Option<f64>, level| match best {
                Some(b) if b >= level => Some(b),
                _ => Some(level),
            })
    }

    /// Closest level at or above `price`.
    pub fn nearest_resistance(&self, price: f64) -> Option<f64> {
        self.all_levels()
            .filter(|&level| level >= price)
            .fold(None, |best: Option<f64>, level| match best {
                Some(b) if b <= level => Some(b),
                _ => Some(level),
            })
    }
}

fn recent_mean(points: &[SwingPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let recent = &points[points.len().saturating_sub(RECENT_SWINGS)..];
    Some(recent.iter().map(|p| p.price).sum::<f64>() / recent.len() as f64)
}

pub fn support_resistance(candles: &[Candle]) -> Option<SupportResistance> {
    if candles.len() < MIN_CANDLES {
        return None;
    }

    let highs = swing_highs(candles, SWING_STRENGTH);
    let lows = swing_lows(candles, SWING_STRENGTH);

    let window_high = highest(candles.iter().map(|c| c.high));
    let window_low = lowest(candles.iter().map(|c| c.low));
    let span = window_high - window_low;
    let fibonacci = FIB_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: window_high - span * ratio,
        })
        .collect();

    Some(SupportResistance {
        support: recent_mean(&lows),
        resistance: recent_mean(&highs),
        pivots: PivotLevels::from_candle(&candles[candles.len() - 1]),
        fibonacci,
        swing_highs: highs,
        swing_lows: lows,
    })
}
