//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (k × StdDev)
//! - Lower: Middle - (k × StdDev)
//!
//! StdDev is the population standard deviation. Defaults: n=20, k=2.0.
//! Output length: len - n + 1.

use crate::domain::indicator::sma;
use crate::domain::indicator::stddev::rolling_stddev;
use serde::Serialize;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerPoint {
    /// %B: 0 at the lower band, 1 at the upper band. A zero-width band
    /// reports 0.5.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width == 0.0 {
            0.5
        } else {
            (price - self.lower) / width
        }
    }

    /// Band width relative to the middle band, in percent.
    pub fn bandwidth_pct(&self) -> f64 {
        if self.middle == 0.0 {
            0.0
        } else {
            (self.upper - self.lower) / self.middle * 100.0
        }
    }
}

pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> Vec<BollingerPoint> {
    let middles = sma(closes, period);
    let deviations = rolling_stddev(closes, period);

    middles
        .into_iter()
        .zip(deviations)
        .map(|(middle, sd)| BollingerPoint {
            upper: middle + multiplier * sd,
            middle,
            lower: middle - multiplier * sd,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_constant_prices_collapse() {
        let out = bollinger(&[100.0; 25], 20, 2.0);
        assert_eq!(out.len(), 6);
        for p in out {
            assert!((p.upper - 100.0).abs() < 1e-12);
            assert!((p.lower - 100.0).abs() < 1e-12);
            assert_eq!(p.percent_b(100.0), 0.5);
        }
    }

    #[test]
    fn bollinger_known_values() {
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = bollinger(&closes, 8, 2.0);
        assert_eq!(out.len(), 1);
        assert!((out[0].middle - 5.0).abs() < 1e-12);
        assert!((out[0].upper - 9.0).abs() < 1e-12);
        assert!((out[0].lower - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bollinger_symmetry() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i as f64).sin()).collect();
        for p in bollinger(&closes, 20, 2.0) {
            assert!(((p.upper - p.middle) - (p.middle - p.lower)).abs() < 1e-9);
        }
    }

    #[test]
    fn percent_b_positions() {
        let p = BollingerPoint {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
        };
        assert!((p.percent_b(90.0)).abs() < 1e-12);
        assert!((p.percent_b(110.0) - 1.0).abs() < 1e-12);
        assert!(p.percent_b(115.0) > 1.0);
        assert!((p.bandwidth_pct() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn bollinger_insufficient() {
        assert!(bollinger(&[1.0; 19], 20, 2.0).is_empty());
    }
}
