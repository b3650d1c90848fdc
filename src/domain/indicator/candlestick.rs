//! Candlestick pattern recognition on the most recent candles.
//!
//! Single-candle patterns use body/shadow ratios relative to the candle
//! range; two-candle patterns compare the last candle's body with the one
//! before it. The reading's score is the mean bias of the matched patterns
//! in [-1, 1].

use crate::domain::indicator::Bias;
use crate::domain::ohlcv::Candle;
use serde::Serialize;

const DOJI_BODY_RATIO: f64 = 0.1;
const SHADOW_BODY_RATIO: f64 = 2.0;
const SMALL_SHADOW_RATIO: f64 = 0.2;
const MARUBOZU_SHADOW_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    BullishMarubozu,
    BearishMarubozu,
}

impl CandlePattern {
    pub fn bias(&self) -> Bias {
        match self {
            CandlePattern::Doji => Bias::Neutral,
            CandlePattern::Hammer
            | CandlePattern::BullishEngulfing
            | CandlePattern::BullishMarubozu => Bias::Bullish,
            CandlePattern::ShootingStar
            | CandlePattern::BearishEngulfing
            | CandlePattern::BearishMarubozu => Bias::Bearish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickReading {
    pub patterns: Vec<CandlePattern>,
    pub bias: Bias,
    pub score: f64,
}

fn single_candle_patterns(candle: &Candle, out: &mut Vec<CandlePattern>) {
    let range = candle.range();
    if range == 0.0 {
        return;
    }
    let body = candle.body();
    let upper = candle.upper_shadow();
    let lower = candle.lower_shadow();

    if body / range < DOJI_BODY_RATIO {
        out.push(CandlePattern::Doji);
    }
    if body > 0.0 && lower / body >= SHADOW_BODY_RATIO && upper / range < SMALL_SHADOW_RATIO {
        out.push(CandlePattern::Hammer);
    }
    if body > 0.0 && upper / body >= SHADOW_BODY_RATIO && lower / range < SMALL_SHADOW_RATIO {
        out.push(CandlePattern::ShootingStar);
    }
    if upper / range < MARUBOZU_SHADOW_RATIO && lower / range < MARUBOZU_SHADOW_RATIO {
        if candle.is_bullish() {
            out.push(CandlePattern::BullishMarubozu);
        } else if candle.is_bearish() {
            out.push(CandlePattern::BearishMarubozu);
        }
    }
}

fn engulfing(prev: &Candle, curr: &Candle) -> Option<CandlePattern> {
    if prev.body() == 0.0 || curr.body() < prev.body() {
        return None;
    }
    if prev.is_bearish() && curr.is_bullish() && curr.open <= prev.close && curr.close >= prev.open {
        return Some(CandlePattern::BullishEngulfing);
    }
    if prev.is_bullish() && curr.is_bearish() && curr.open >= prev.close && curr.close <= prev.open {
        return Some(CandlePattern::BearishEngulfing);
    }
    None
}

pub fn candlestick_patterns(candles: &[Candle]) -> Option<CandlestickReading> {
    let curr = candles.last()?;
    let mut patterns = Vec::new();
    single_candle_patterns(curr, &mut patterns);
    if candles.len() >= 2 {
        patterns.extend(engulfing(&candles[candles.len() - 2], curr));
    }

    let score = if patterns.is_empty() {
        0.0
    } else {
        patterns
            .iter()
            .map(|p| match p.bias() {
                Bias::Bullish => 1.0,
                Bias::Bearish => -1.0,
                Bias::Neutral => 0.0,
            })
            .sum::<f64>()
            / patterns.len() as f64
    };

    Some(CandlestickReading {
        bias: Bias::from_change(score),
        patterns,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: 0,
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn doji_is_neutral() {
        let reading = candlestick_patterns(&[c(100.0, 105.0, 95.0, 100.2)]).unwrap();
        assert!(reading.patterns.contains(&CandlePattern::Doji));
        assert_eq!(reading.bias, Bias::Neutral);
    }

    #[test]
    fn hammer_has_long_lower_shadow() {
        let reading = candlestick_patterns(&[c(100.0, 101.2, 94.0, 101.0)]).unwrap();
        assert_eq!(reading.patterns, vec![CandlePattern::Hammer]);
        assert_eq!(reading.bias, Bias::Bullish);
    }

    #[test]
    fn shooting_star_has_long_upper_shadow() {
        let reading = candlestick_patterns(&[c(100.0, 106.0, 98.8, 99.0)]).unwrap();
        assert!(reading.patterns.contains(&CandlePattern::ShootingStar));
        assert_eq!(reading.bias, Bias::Bearish);
    }

    #[test]
    fn bullish_engulfing() {
        let candles = [c(102.0, 102.5, 99.5, 100.0), c(99.5, 103.5, 99.0, 103.0)];
        let reading = candlestick_patterns(&candles).unwrap();
        assert!(reading.patterns.contains(&CandlePattern::BullishEngulfing));
        assert!(reading.score > 0.0);
    }

    #[test]
    fn bearish_marubozu() {
        let reading = candlestick_patterns(&[c(110.0, 110.0, 100.0, 100.0)]).unwrap();
        assert!(reading.patterns.contains(&CandlePattern::BearishMarubozu));
    }

    #[test]
    fn zero_range_has_no_patterns() {
        let reading = candlestick_patterns(&[c(1.0, 1.0, 1.0, 1.0)]).unwrap();
        assert!(reading.patterns.is_empty());
        assert_eq!(reading.score, 0.0);
    }

    #[test]
    fn empty_input() {
        assert!(candlestick_patterns(&[]).is_none());
    }
}
