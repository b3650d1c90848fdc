#![allow(dead_code)]

use signalgate::domain::config::{PipelineConfig, Thresholds, TradingMode};
use signalgate::domain::error::SignalGateError;
use signalgate::domain::ohlcv::{Candle, Interval, OhlcvSeries};
use signalgate::domain::signal::{EntryOrder, SignalCandidate, Side};
use signalgate::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<(String, Interval), Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, asset: &str, interval: Interval, candles: Vec<Candle>) -> Self {
        self.data.insert((asset.to_string(), interval), candles);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self, asset: &str, interval: Interval) -> Result<OhlcvSeries, SignalGateError> {
        if let Some(reason) = self.errors.get(asset) {
            return Err(SignalGateError::InvalidSeries {
                asset: asset.to_string(),
                reason: reason.clone(),
            });
        }
        match self.data.get(&(asset.to_string(), interval)) {
            Some(candles) => OhlcvSeries::new(asset, interval, candles.clone()),
            None => Err(SignalGateError::NoData {
                asset: asset.to_string(),
                interval: interval.to_string(),
            }),
        }
    }

    fn list_assets(&self, interval: Interval) -> Result<Vec<String>, SignalGateError> {
        let mut assets: Vec<String> = self
            .data
            .keys()
            .filter(|(_, i)| *i == interval)
            .map(|(a, _)| a.clone())
            .collect();
        assets.sort();
        Ok(assets)
    }
}

/// Candles from closes: open at the previous close, wicks one unit past
/// the body, constant volume, spaced one interval apart.
pub fn candles_from_closes(closes: &[f64], interval: Interval) -> Vec<Candle> {
    let step = interval.duration_ms();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: i as i64 * step,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

pub fn rising_closes(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Flat chop followed by a flush through the lower band and a reclaim on
/// the final bar.
pub fn bounce_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
    closes.extend([98.0, 95.0, 91.0, 97.5]);
    closes
}

pub fn series(asset: &str, interval: Interval, closes: &[f64]) -> OhlcvSeries {
    OhlcvSeries::new(asset, interval, candles_from_closes(closes, interval)).unwrap()
}

pub fn sample_config(mode: TradingMode) -> PipelineConfig {
    PipelineConfig::new(
        mode,
        Thresholds {
            high: 0.75,
            medium: 0.6,
            low: 0.45,
            reject: 0.3,
        },
        Thresholds {
            high: 1.0,
            medium: 0.5,
            low: 0.2,
            reject: 0.0,
        },
    )
}

pub fn market_entry(asset: &str, side: Side, price: f64) -> SignalCandidate {
    SignalCandidate::open(
        asset,
        side,
        EntryOrder {
            entry_price: price,
            stop_loss: None,
            take_profit: None,
            raw_confidence: None,
        },
    )
}

pub const VALID_INI: &str = r#"
[trading]
mode = manual_review
allow_flip = false
account_equity = 25000

[confidence_thresholds]
high = 0.75
medium = 0.6
low = 0.45
reject = 0.3

[ev_thresholds]
high = 1.0
medium = 0.5
low = 0.2
reject = 0.0

[position_sizing]
high_multiplier = 1.0
medium_multiplier = 0.75
low_multiplier = 0.5

[safety]
max_risk_per_trade = 2.0
max_open_positions = 5
daily_loss_limit = 5.0
consecutive_losses = 3

[leverage]
default_max = 10
BTC = 20
"#;
