//! CSV file data adapter.
//!
//! Reads `<base>/<ASSET>_<interval>.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are epoch
//! milliseconds or RFC 3339 strings. Rows may be in any order.

use crate::domain::error::SignalGateError;
use crate::domain::ohlcv::{Candle, Interval, OhlcvSeries};
use crate::ports::data_port::DataPort;
use chrono::DateTime;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.timestamp_millis()))
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset: &str, interval: Interval) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", asset.to_uppercase(), interval))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self, asset: &str, interval: Interval) -> Result<OhlcvSeries, SignalGateError> {
        let asset = asset.to_uppercase();
        let path = self.csv_path(&asset, interval);
        let content = fs::read_to_string(&path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "candle file unreadable");
            SignalGateError::NoData {
                asset: asset.clone(),
                interval: interval.to_string(),
            }
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| SignalGateError::InvalidSeries {
                asset: asset.clone(),
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| SignalGateError::InvalidSeries {
                asset: asset.clone(),
                reason: format!("invalid timestamp '{}' on data row {}", row.timestamp, line + 1),
            })?;
            candles.push(Candle::new(timestamp, row.open, row.high, row.low, row.close, row.volume)?);
        }

        candles.sort_by_key(|c| c.timestamp);
        debug!(asset = %asset, interval = %interval, candles = candles.len(), "loaded candles");
        OhlcvSeries::new(asset, interval, candles)
    }

    fn list_assets(&self, interval: Interval) -> Result<Vec<String>, SignalGateError> {
        let entries = fs::read_dir(&self.base_path)?;

        let suffix = format!("_{}.csv", interval);
        let mut assets = Vec::new();

        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();

            if let Some(asset) = name_str.strip_suffix(&suffix) {
                assets.push(asset.to_string());
            }
        }

        assets.sort();
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            7200000,110.0,120.0,105.0,115.0,55000\n\
            0,100.0,110.0,90.0,105.0,50000\n\
            3600000,105.0,115.0,100.0,110.0,60000.5\n";

        fs::write(path.join("BTC_1h.csv"), csv_content).unwrap();
        fs::write(
            path.join("ETH_1h.csv"),
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T00:00:00Z,10,11,9,10.5,100\n",
        )
        .unwrap();
        fs::write(path.join("SOL_4h.csv"), "timestamp,open,high,low,close,volume\n").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_sorts_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_ohlcv("btc", Interval::OneHour).unwrap();

        assert_eq!(series.asset(), "BTC");
        assert_eq!(series.len(), 3);
        let candles = series.candles();
        assert_eq!(candles[0].timestamp, 0);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 110.0);
        assert_eq!(candles[0].low, 90.0);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[1].volume, 60000.5);
        assert_eq!(series.last().timestamp, 7_200_000);
    }

    #[test]
    fn fetch_ohlcv_accepts_rfc3339() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_ohlcv("ETH", Interval::OneHour).unwrap();
        assert_eq!(series.last().timestamp, 1_705_276_800_000);
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_ohlcv("XYZ", Interval::OneHour).unwrap_err();
        assert!(matches!(err, SignalGateError::NoData { .. }));
    }

    #[test]
    fn empty_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_ohlcv("SOL", Interval::FourHours).unwrap_err();
        assert!(matches!(err, SignalGateError::NoData { .. }));
    }

    #[test]
    fn invalid_candle_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD_1d.csv"),
            "timestamp,open,high,low,close,volume\n0,100,99,90,95,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_ohlcv("BAD", Interval::OneDay).unwrap_err();
        assert!(matches!(err, SignalGateError::InvalidCandle { .. }));
    }

    #[test]
    fn list_assets_by_interval() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_assets(Interval::OneHour).unwrap(), vec!["BTC", "ETH"]);
        assert_eq!(adapter.list_assets(Interval::FourHours).unwrap(), vec!["SOL"]);
    }
}
