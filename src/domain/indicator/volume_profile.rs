//! Volume profile (session and composite).
//!
//! The window's [lowest low, highest high] range is split into `BUCKETS`
//! equal buckets. Each candle's volume is spread over the buckets in
//! proportion to their overlap with the candle's [low, high]; a zero-range
//! candle puts all its volume in the bucket holding its close.
//!
//! - POC: midpoint of the highest-volume bucket (lowest price on ties).
//! - Value area: starting from the POC, add the neighbouring bucket with
//!   more volume until `VALUE_AREA_SHARE` of the total is covered. Equal
//!   volumes go to the bucket closer to the POC, then to the upper one.
//! - High-volume nodes: local-maximum buckets with volume >= 1.5× the mean.
//!
//! The session profile covers the last day of candles for the interval;
//! the composite profile covers the whole window.

use crate::domain::indicator_helpers::{highest, lowest};
use crate::domain::ohlcv::{Candle, Interval};
use serde::{Deserialize, Serialize};

pub const BUCKETS: usize = 50;
pub const VALUE_AREA_SHARE: f64 = 0.70;
pub const HVN_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub poc: f64,
    pub value_area_high: f64,
    pub value_area_low: f64,
    #[serde(default)]
    pub high_volume_nodes: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfilePosition {
    AboveValueArea,
    InValueArea,
    BelowValueArea,
}

impl VolumeProfile {
    pub fn position(&self, price: f64) -> ProfilePosition {
        if price > self.value_area_high {
            ProfilePosition::AboveValueArea
        } else if price < self.value_area_low {
            ProfilePosition::BelowValueArea
        } else {
            ProfilePosition::InValueArea
        }
    }

    /// Percentage distance from `price` to the nearest high-volume node.
    pub fn nearest_hvn_distance_pct(&self, price: f64) -> Option<f64> {
        if price == 0.0 {
            return None;
        }
        self.high_volume_nodes
            .iter()
            .map(|node| (node - price).abs() / price * 100.0)
            .reduce(f64::min)
    }
}

/// Bucketed volume and bucket geometry, kept separate for testing.
struct Histogram {
    low: f64,
    size: f64,
    volumes: Vec<f64>,
}

impl Histogram {
    fn build(candles: &[Candle], buckets: usize) -> Option<Self> {
        let low = lowest(candles.iter().map(|c| c.low));
        let high = highest(candles.iter().map(|c| c.high));
        let size = (high - low) / buckets as f64;
        let mut volumes = vec![0.0; buckets];

        for candle in candles {
            if size == 0.0 || candle.range() == 0.0 {
                let idx = if size == 0.0 {
                    0
                } else {
                    (((candle.close - low) / size) as usize).min(buckets - 1)
                };
                volumes[idx] += candle.volume;
                continue;
            }
            let first = (((candle.low - low) / size) as usize).min(buckets - 1);
            let last = (((candle.high - low) / size) as usize).min(buckets - 1);
            for (idx, bucket) in volumes.iter_mut().enumerate().take(last + 1).skip(first) {
                let b_low = low + idx as f64 * size;
                let b_high = b_low + size;
                let overlap = candle.high.min(b_high) - candle.low.max(b_low);
                if overlap > 0.0 {
                    *bucket += candle.volume * overlap / candle.range();
                }
            }
        }

        if volumes.iter().sum::<f64>() <= 0.0 {
            return None;
        }
        Some(Self { low, size, volumes })
    }

    fn bucket_low(&self, idx: usize) -> f64 {
        self.low + idx as f64 * self.size
    }

    fn poc_index(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.volumes.iter().enumerate() {
            if v > self.volumes[best] {
                best = i;
            }
        }
        best
    }

    fn value_area(&self, poc: usize) -> (usize, usize) {
        let total: f64 = self.volumes.iter().sum();
        let target = total * VALUE_AREA_SHARE;
        let (mut lo, mut hi) = (poc, poc);
        let mut covered = self.volumes[poc];

        while covered < target && (lo > 0 || hi + 1 < self.volumes.len()) {
            let up = (hi + 1 < self.volumes.len()).then(|| self.volumes[hi + 1]);
            let down = (lo > 0).then(|| self.volumes[lo - 1]);
            let take_up = match (up, down) {
                (Some(u), Some(d)) if u != d => u > d,
                (Some(_), Some(_)) => (hi + 1 - poc) <= (poc - (lo - 1)),
                (Some(_), None) => true,
                _ => false,
            };
            if take_up {
                hi += 1;
                covered += self.volumes[hi];
            } else {
                lo -= 1;
                covered += self.volumes[lo];
            }
        }
        (lo, hi)
    }

    fn high_volume_nodes(&self) -> Vec<f64> {
        let n = self.volumes.len();
        let mean = self.volumes.iter().sum::<f64>() / n as f64;
        (0..n)
            .filter(|&i| {
                let v = self.volumes[i];
                let left = if i > 0 { self.volumes[i - 1] } else { f64::NEG_INFINITY };
                let right = if i + 1 < n { self.volumes[i + 1] } else { f64::NEG_INFINITY };
                v >= HVN_FACTOR * mean && v >= left && v >= right
            })
            .map(|i| self.bucket_low(i) + self.size / 2.0)
            .collect()
    }
}

pub fn volume_profile(candles: &[Candle], buckets: usize) -> Option<VolumeProfile> {
    if candles.len() < 2 || buckets == 0 {
        return None;
    }
    let hist = Histogram::build(candles, buckets)?;
    let poc_idx = hist.poc_index();
    let (lo, hi) = hist.value_area(poc_idx);

    Some(VolumeProfile {
        poc: hist.bucket_low(poc_idx) + hist.size / 2.0,
        value_area_high: hist.bucket_low(hi) + hist.size,
        value_area_low: hist.bucket_low(lo),
        high_volume_nodes: hist.high_volume_nodes(),
    })
}

/// Profile of the most recent day of candles.
pub fn session_profile(candles: &[Candle], interval: Interval) -> Option<VolumeProfile> {
    let start = candles.len().saturating_sub(interval.candles_per_day().max(2));
    volume_profile(&candles[start..], BUCKETS)
}

pub fn composite_profile(candles: &[Candle]) -> Option<VolumeProfile> {
    volume_profile(candles, BUCKETS)
}
