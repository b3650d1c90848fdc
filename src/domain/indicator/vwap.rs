//! VWAP (Volume-Weighted Average Price) over the full window.
//!
//! VWAP = Σ(typical price × volume) / Σ volume; `None` when total volume is 0.

use crate::domain::ohlcv::Candle;

pub fn vwap(candles: &[Candle]) -> Option<f64> {
    let (pv, volume) = candles.iter().fold((0.0, 0.0), |(pv, vol), c| {
        (pv + c.typical_price() * c.volume, vol + c.volume)
    });
    if volume == 0.0 {
        None
    } else {
        Some(pv / volume)
    }
}
