//! Trend detection and market structure.
//!
//! Trend: EMA(20) vs EMA(50). The fast EMA more than `NEUTRAL_BAND_PCT`
//! above the slow EMA is an uptrend, that far below is a downtrend,
//! anything closer is neutral.
//!
//! Market structure: compares the last two swing highs and the last two
//! swing lows. Higher high + higher low is bullish, lower high + lower low
//! is bearish, anything else is ranging.

use crate::domain::indicator::ema;
use crate::domain::indicator_helpers::{SwingPoint, swing_highs, swing_lows};
use crate::domain::ohlcv::Candle;
use serde::{Deserialize, Serialize};

pub const FAST_PERIOD: usize = 20;
pub const SLOW_PERIOD: usize = 50;
pub const NEUTRAL_BAND_PCT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReading {
    pub trend: Trend,
    pub fast_ema: f64,
    pub slow_ema: f64,
    /// |fast - slow| / slow, in percent.
    pub spread_pct: f64,
}

/// Classify the trend from the latest EMA(20)/EMA(50) pair.
pub fn detect_trend(closes: &[f64]) -> Option<TrendReading> {
    let fast = *ema(closes, FAST_PERIOD).last()?;
    let slow = *ema(closes, SLOW_PERIOD).last()?;
    Some(classify_emas(fast, slow))
}

pub fn classify_emas(fast: f64, slow: f64) -> TrendReading {
    let spread_pct = if slow == 0.0 {
        0.0
    } else {
        (fast - slow) / slow * 100.0
    };
    let trend = if spread_pct > NEUTRAL_BAND_PCT {
        Trend::Uptrend
    } else if spread_pct < -NEUTRAL_BAND_PCT {
        Trend::Downtrend
    } else {
        Trend::Neutral
    };
    TrendReading {
        trend,
        fast_ema: fast,
        slow_ema: slow,
        spread_pct: spread_pct.abs(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Bullish,
    Bearish,
    Ranging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketStructure {
    pub structure: Structure,
    pub higher_high: bool,
    pub higher_low: bool,
    pub last_swing_high: Option<SwingPoint>,
    pub last_swing_low: Option<SwingPoint>,
    /// 0-100: 50 per structural leg that agrees with the label.
    pub score: f64,
}

/// Classify the last two swings of each side. Needs at least two swing
/// highs and two swing lows.
pub fn classify_swings(highs: &[SwingPoint], lows: &[SwingPoint]) -> Option<MarketStructure> {
    if highs.len() < 2 || lows.len() < 2 {
        return None;
    }
    let (h1, h2) = (highs[highs.len() - 2], highs[highs.len() - 1]);
    let (l1, l2) = (lows[lows.len() - 2], lows[lows.len() - 1]);

    let higher_high = h2.price > h1.price;
    let higher_low = l2.price > l1.price;
    let lower_high = h2.price < h1.price;
    let lower_low = l2.price < l1.price;

    let bullish_legs = higher_high as u8 + higher_low as u8;
    let bearish_legs = lower_high as u8 + lower_low as u8;
    let (structure, score) = match (bullish_legs, bearish_legs) {
        (legs, 0) if legs > 0 => (Structure::Bullish, 50.0 * legs as f64),
        (0, legs) if legs > 0 => (Structure::Bearish, 50.0 * legs as f64),
        _ => (Structure::Ranging, 0.0),
    };

    Some(MarketStructure {
        structure,
        higher_high,
        higher_low,
        last_swing_high: Some(h2),
        last_swing_low: Some(l2),
        score,
    })
}

pub fn market_structure(candles: &[Candle], strength: usize) -> Option<MarketStructure> {
    classify_swings(
        &swing_highs(candles, strength),
        &swing_lows(candles, strength),
    )
}
