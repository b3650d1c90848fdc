//! Market data access port trait.

use crate::domain::error::SignalGateError;
use crate::domain::ohlcv::{Interval, OhlcvSeries};

pub trait DataPort {
    /// Full candle history for one (asset, interval), oldest first.
    fn fetch_ohlcv(&self, asset: &str, interval: Interval) -> Result<OhlcvSeries, SignalGateError>;

    fn list_assets(&self, interval: Interval) -> Result<Vec<String>, SignalGateError>;
}
