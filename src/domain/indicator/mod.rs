//! Technical indicator implementations.
//!
//! Every function here is pure. Inputs are candle slices or plain value
//! slices; outputs are aligned to the *suffix* of the input, i.e. the first
//! output belongs to the first candle at which the indicator has finished
//! warming up. Input shorter than the warm-up yields an empty `Vec` (or
//! `None` for single-valued studies), never a panic or a NaN.
//!
//! - `IndicatorType`: indicator identity + parameters, used to name values in
//!   snapshots

pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod candlestick;
pub mod cci;
pub mod change_of_character;
pub mod correlation;
pub mod cvd;
pub mod divergence;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod parabolic_sar;
pub mod regime;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod support_resistance;
pub mod trend;
pub mod volume_profile;
pub mod vwap;
pub mod williams_r;

pub use ema::ema;
pub use sma::sma;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional lean of a classifier reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    /// Sign of a change: positive is bullish, negative bearish, zero neutral.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Bias::Bullish
        } else if change < 0.0 {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Bias::Bullish => Bias::Bearish,
            Bias::Bearish => Bias::Bullish,
            Bias::Neutral => Bias::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Cci(usize),
    WilliamsR(usize),
    Aroon(usize),
    Stddev(usize),
    Obv,
    Vwap,
    ParabolicSar,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    SupportResistance,
    VolumeProfile,
    ChangeOfCharacter,
    Cvd(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::WilliamsR(period) => write!(f, "WILLIAMS_R({})", period),
            IndicatorType::Aroon(period) => write!(f, "AROON({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::ParabolicSar => write!(f, "PSAR"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::SupportResistance => write!(f, "SUPPORT_RESISTANCE"),
            IndicatorType::VolumeProfile => write!(f, "VOLUME_PROFILE"),
            IndicatorType::ChangeOfCharacter => write!(f, "COC"),
            IndicatorType::Cvd(window) => write!(f, "CVD({})", window),
        }
    }
}

/// Synthetic candles from closes for tests.
///
/// open = previous close (or close for the first candle), high/low one unit
/// outside the body, volume 1000, hourly timestamps.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::ohlcv::Candle> {
    use crate::domain::ohlcv::Candle;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: i as i64 * 3_600_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Candles from explicit (high, low, close) triples for tests.
#[cfg(test)]
pub fn make_hlc(data: &[(f64, f64, f64)]) -> Vec<crate::domain::ohlcv::Candle> {
    use crate::domain::ohlcv::Candle;
    data.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| Candle {
            timestamp: i as i64 * 3_600_000,
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}
