//! Cumulative Volume Delta.
//!
//! Each candle's volume is split by where the close sits relative to the
//! open within the range:
//!   buy  = volume × (1 + (close - open) / (high - low)) / 2
//!   sell = volume - buy
//! so delta = buy - sell = volume × (close - open) / (high - low), and 0 for
//! a zero-range candle. CVD is the running sum of deltas.
//!
//! Over a rolling window, CVD and price trends are compared; opposite
//! directions flag a divergence in the direction CVD points.

use crate::domain::indicator::Bias;
use crate::domain::ohlcv::Candle;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CvdReading {
    pub value: f64,
    pub trend: Bias,
    #[serde(default)]
    pub divergence: Option<Bias>,
}

pub fn volume_delta(candle: &Candle) -> f64 {
    let range = candle.range();
    if range == 0.0 {
        0.0
    } else {
        candle.volume * (candle.close - candle.open) / range
    }
}

pub fn cvd(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .scan(0.0, |total, c| {
            *total += volume_delta(c);
            Some(*total)
        })
        .collect()
}

pub fn cvd_analysis(candles: &[Candle], window: usize) -> Option<CvdReading> {
    if window == 0 || candles.len() < window + 1 {
        return None;
    }
    let series = cvd(candles);
    let last = series.len() - 1;
    let cvd_trend = Bias::from_change(series[last] - series[last - window]);
    let price_trend = Bias::from_change(candles[last].close - candles[last - window].close);

    let divergence = match (price_trend, cvd_trend) {
        (Bias::Bearish, Bias::Bullish) => Some(Bias::Bullish),
        (Bias::Bullish, Bias::Bearish) => Some(Bias::Bearish),
        _ => None,
    };

    Some(CvdReading {
        value: series[last],
        trend: cvd_trend,
        divergence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: 0,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn delta_splits_by_body() {
        // Close at the high from the low: all buying.
        assert_eq!(volume_delta(&c(10.0, 12.0, 10.0, 12.0, 100.0)), 100.0);
        // Half-range bearish body.
        assert_eq!(volume_delta(&c(12.0, 12.0, 8.0, 10.0, 100.0)), -50.0);
        assert_eq!(volume_delta(&c(10.0, 10.0, 10.0, 10.0, 100.0)), 0.0);
    }

    #[test]
    fn cvd_accumulates() {
        let candles = [
            c(10.0, 12.0, 10.0, 12.0, 100.0),
            c(12.0, 12.0, 8.0, 10.0, 100.0),
        ];
        assert_eq!(cvd(&candles), vec![100.0, 50.0]);
    }

    #[test]
    fn price_down_with_buying_is_bullish_divergence() {
        // Each candle closes lower than the last but above its own open.
        let candles: Vec<Candle> = (0..6)
            .map(|i| {
                let base = 100.0 - 2.0 * i as f64;
                c(base - 1.0, base + 0.5, base - 1.5, base, 100.0)
            })
            .collect();
        let reading = cvd_analysis(&candles, 5).unwrap();
        assert_eq!(reading.trend, Bias::Bullish);
        assert_eq!(reading.divergence, Some(Bias::Bullish));
    }

    #[test]
    fn confirmed_trend_has_no_divergence() {
        let candles: Vec<Candle> = (0..6)
            .map(|i| {
                let base = 100.0 + 2.0 * i as f64;
                c(base - 1.0, base + 0.5, base - 1.5, base, 100.0)
            })
            .collect();
        let reading = cvd_analysis(&candles, 5).unwrap();
        assert_eq!(reading.trend, Bias::Bullish);
        assert_eq!(reading.divergence, None);
    }

    #[test]
    fn needs_window_plus_one() {
        let candles = vec![c(1.0, 1.0, 1.0, 1.0, 1.0); 5];
        assert!(cvd_analysis(&candles, 5).is_none());
    }
}
