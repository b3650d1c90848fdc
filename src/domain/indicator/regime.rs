//! Market regime classification from ADX(14) and Bollinger bandwidth.
//!
//! - Trending: ADX >= 25
//! - Choppy: ADX < 20 and bandwidth below `CHOPPY_BANDWIDTH_PCT`
//! - Neutral: everything else
//!
//! The score (0-100) is the ADX value itself for trending markets and
//! 100 - ADX otherwise, i.e. how strongly the label is expressed.

use crate::domain::indicator::adx::{self, adx};
use crate::domain::indicator::bollinger::{self, bollinger};
use crate::domain::ohlcv::{Candle, closes};
use serde::{Deserialize, Serialize};

pub const TRENDING_ADX: f64 = 25.0;
pub const CHOPPY_ADX: f64 = 20.0;
pub const CHOPPY_BANDWIDTH_PCT: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegime {
    Trending,
    Choppy,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeReading {
    pub regime: MarketRegime,
    pub adx: f64,
    pub bandwidth_pct: Option<f64>,
    pub score: f64,
}

pub fn classify_regime(adx: f64, bandwidth_pct: Option<f64>) -> RegimeReading {
    let tight = bandwidth_pct.is_some_and(|bw| bw < CHOPPY_BANDWIDTH_PCT);
    let regime = if adx >= TRENDING_ADX {
        MarketRegime::Trending
    } else if adx < CHOPPY_ADX && tight {
        MarketRegime::Choppy
    } else {
        MarketRegime::Neutral
    };
    let score = match regime {
        MarketRegime::Trending => adx.min(100.0),
        _ => (100.0 - adx).max(0.0),
    };
    RegimeReading {
        regime,
        adx,
        bandwidth_pct,
        score,
    }
}

pub fn market_regime(candles: &[Candle]) -> Option<RegimeReading> {
    let adx_value = adx(candles, adx::DEFAULT_PERIOD).last()?.adx;
    let bandwidth = bollinger(
        &closes(candles),
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_MULTIPLIER,
    )
    .last()
    .map(|b| b.bandwidth_pct());
    Some(classify_regime(adx_value, bandwidth))
}
