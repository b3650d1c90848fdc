//! Change of Character (COC).
//!
//! The prior structure comes from the last two swing highs and lows
//! (higher-high/higher-low = bullish, lower-high/lower-low = bearish). A
//! close beyond the structure's protective swing flips it:
//! - bearish structure, close above the last swing high: bullish reversal
//! - bullish structure, close below the last swing low: bearish reversal
//!
//! Strength (0-100) = half the structure score + up to 30 for the size of
//! the break (15 per percent) + 20 when the breaking candle's volume is
//! above the recent average.

use crate::domain::indicator::Bias;
use crate::domain::indicator::trend::{Structure, market_structure};
use crate::domain::ohlcv::Candle;
use serde::{Deserialize, Serialize};

pub const SWING_STRENGTH: usize = 2;
pub const MIN_CANDLES: usize = 20;
const VOLUME_LOOKBACK: usize = 20;
const BREAK_POINTS_PER_PCT: f64 = 15.0;
const MAX_BREAK_POINTS: f64 = 30.0;
const VOLUME_POINTS: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeOfCharacter {
    pub prior_structure: Structure,
    /// Direction of the new character, if the structure broke.
    #[serde(default)]
    pub reversal: Option<Bias>,
    #[serde(default)]
    pub broken_level: Option<f64>,
    pub strength: f64,
}

impl ChangeOfCharacter {
    fn unbroken(prior_structure: Structure) -> Self {
        Self {
            prior_structure,
            reversal: None,
            broken_level: None,
            strength: 0.0,
        }
    }
}

pub fn change_of_character(candles: &[Candle]) -> Option<ChangeOfCharacter> {
    if candles.len() < MIN_CANDLES {
        return None;
    }
    let Some(structure) = market_structure(candles, SWING_STRENGTH) else {
        return Some(ChangeOfCharacter::unbroken(Structure::Ranging));
    };

    let last = &candles[candles.len() - 1];
    let broken = match structure.structure {
        Structure::Bearish => structure
            .last_swing_high
            .filter(|sh| last.close > sh.price)
            .map(|sh| (Bias::Bullish, sh.price)),
        Structure::Bullish => structure
            .last_swing_low
            .filter(|sl| last.close < sl.price)
            .map(|sl| (Bias::Bearish, sl.price)),
        Structure::Ranging => None,
    };
    let Some((reversal, level)) = broken else {
        return Some(ChangeOfCharacter::unbroken(structure.structure));
    };

    let break_pct = (last.close - level).abs() / level * 100.0;
    let prior = &candles[candles.len().saturating_sub(VOLUME_LOOKBACK + 1)..candles.len() - 1];
    let avg_volume = prior.iter().map(|c| c.volume).sum::<f64>() / prior.len() as f64;
    let volume_points = if last.volume > avg_volume { VOLUME_POINTS } else { 0.0 };

    let strength = (structure.score * 0.5
        + (break_pct * BREAK_POINTS_PER_PCT).min(MAX_BREAK_POINTS)
        + volume_points)
        .clamp(0.0, 100.0);

    Some(ChangeOfCharacter {
        prior_structure: structure.structure,
        reversal: Some(reversal),
        broken_level: Some(level),
        strength,
    })
}
