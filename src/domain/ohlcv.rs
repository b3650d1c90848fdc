//! OHLCV candle and series representation.

use crate::domain::error::SignalGateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HOUR_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in epoch milliseconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Build a candle, checking that high/low bracket the body and volume is non-negative.
    pub fn new(
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, SignalGateError> {
        let candle = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    fn validate(&self) -> Result<(), SignalGateError> {
        let invalid = |reason: &str| SignalGateError::InvalidCandle {
            timestamp: self.timestamp,
            reason: reason.to_string(),
        };
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite value"));
        }
        if self.high < self.open.max(self.close) {
            return Err(invalid("high below body"));
        }
        if self.low > self.open.min(self.close) {
            return Err(invalid("low above body"));
        }
        if self.volume < 0.0 {
            return Err(invalid("negative volume"));
        }
        Ok(())
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Candle interval. Only the timeframes the pipeline aggregates are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    pub fn duration_ms(&self) -> i64 {
        match self {
            Interval::OneHour => HOUR_MS,
            Interval::FourHours => 4 * HOUR_MS,
            Interval::OneDay => 24 * HOUR_MS,
        }
    }

    pub fn candles_per_day(&self) -> usize {
        match self {
            Interval::OneHour => 24,
            Interval::FourHours => 6,
            Interval::OneDay => 1,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = SignalGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" | "24h" => Ok(Interval::OneDay),
            other => Err(SignalGateError::ConfigInvalid {
                section: "data".into(),
                key: "interval".into(),
                reason: format!("unsupported interval '{other}'"),
            }),
        }
    }
}

/// Ordered, immutable candle sequence for one (asset, interval).
#[derive(Debug, Clone, Serialize)]
pub struct OhlcvSeries {
    asset: String,
    interval: Interval,
    candles: Vec<Candle>,
}

impl OhlcvSeries {
    /// Validates every candle, non-emptiness, and strictly increasing timestamps.
    pub fn new(
        asset: impl Into<String>,
        interval: Interval,
        candles: Vec<Candle>,
    ) -> Result<Self, SignalGateError> {
        let asset = asset.into();
        if candles.is_empty() {
            return Err(SignalGateError::NoData {
                asset,
                interval: interval.to_string(),
            });
        }
        for candle in &candles {
            candle.validate()?;
        }
        if let Some(pair) = candles.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(SignalGateError::InvalidSeries {
                asset,
                reason: format!(
                    "timestamps not strictly increasing at {} -> {}",
                    pair[0].timestamp, pair[1].timestamp
                ),
            });
        }
        Ok(Self {
            asset,
            interval,
            candles,
        })
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> &Candle {
        // Non-empty by construction.
        &self.candles[self.candles.len() - 1]
    }

    /// Candles opened at or before `now`. Later candles are not yet visible
    /// at the evaluation instant.
    pub fn up_to(&self, now: i64) -> &[Candle] {
        let end = self.candles.partition_point(|c| c.timestamp <= now);
        &self.candles[..end]
    }
}

pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}
