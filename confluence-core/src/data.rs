//! OHLCV loading from CSV files.
//!
//! One file per symbol and timeframe, named `{symbol}_{timeframe}.csv` with
//! `/` in the symbol replaced by `_` (e.g. `BTC_USDT_15m.csv`). Columns:
//! `timestamp,open,high,low,close,volume`, timestamp in epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::RawFrames;
use crate::config::TimeframeLabels;
use crate::domain::{Candle, TimeframeRole};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} row {row}: timestamp {millis} is out of range")]
    BadTimestamp { path: String, row: usize, millis: i64 },

    #[error("{path} row {row}: OHLC values are not a valid bar")]
    InvalidBar { path: String, row: usize },

    #[error("{path} contains no candles")]
    Empty { path: String },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Read one OHLCV file into raw candles (no indicator values).
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>, DataError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let csv_err = |source| DataError::Csv {
        path: shown.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut candles = Vec::new();
    for (row, record) in reader.deserialize::<CsvRow>().enumerate() {
        let r = record.map_err(csv_err)?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(r.timestamp).ok_or_else(|| {
            DataError::BadTimestamp {
                path: shown.clone(),
                row: row + 1,
                millis: r.timestamp,
            }
        })?;
        let candle = Candle::new(timestamp, r.open, r.high, r.low, r.close, r.volume);
        if !candle.is_sane() {
            return Err(DataError::InvalidBar {
                path: shown.clone(),
                row: row + 1,
            });
        }
        candles.push(candle);
    }

    if candles.is_empty() {
        return Err(DataError::Empty { path: shown });
    }
    tracing::debug!(path = %shown, candles = candles.len(), "loaded OHLCV file");
    Ok(candles)
}

/// File path for a symbol/timeframe pair inside `dir`.
pub fn frame_path(dir: impl AsRef<Path>, symbol: &str, timeframe: &str) -> PathBuf {
    let file_symbol = symbol.replace(['/', ':'], "_");
    dir.as_ref().join(format!("{file_symbol}_{timeframe}.csv"))
}

/// Load all four timeframe files for `symbol`.
pub fn load_frames(
    dir: impl AsRef<Path>,
    symbol: &str,
    labels: &TimeframeLabels,
) -> Result<RawFrames, DataError> {
    let dir = dir.as_ref();
    let load = |role: TimeframeRole| load_csv(frame_path(dir, symbol, labels.get(role)));
    Ok(RawFrames {
        bias: load(TimeframeRole::Bias)?,
        confirmation: load(TimeframeRole::Confirmation)?,
        pattern: load(TimeframeRole::Pattern)?,
        entry: load(TimeframeRole::Entry)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "timestamp,open,high,low,close,volume\n";

    #[test]
    fn loads_rows_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        fs::write(
            &path,
            format!("{HEADER}1704067200000,100,105,99,104,12.5\n1704068100000,104,106,103,105,8\n"),
        )
        .unwrap();

        let candles = load_csv(&path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1_704_067_200_000);
        assert_eq!(candles[1].close, 105.0);
        assert!(candles[1].indicators.atr.is_nan());
    }

    #[test]
    fn rejects_inverted_bar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, format!("{HEADER}1704067200000,100,90,99,95,1\n")).unwrap();
        assert!(matches!(
            load_csv(&path),
            Err(DataError::InvalidBar { row: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, HEADER).unwrap();
        assert!(matches!(load_csv(&path), Err(DataError::Empty { .. })));
    }

    #[test]
    fn missing_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_csv(dir.path().join("nope.csv")),
            Err(DataError::Csv { .. })
        ));
    }

    #[test]
    fn frame_path_sanitizes_symbol() {
        let path = frame_path("data", "BTC/USDT", "15m");
        assert_eq!(path, Path::new("data").join("BTC_USDT_15m.csv"));
    }

    #[test]
    fn load_frames_reads_each_role() {
        let dir = tempfile::tempdir().unwrap();
        let labels = TimeframeLabels::default();
        for role in TimeframeRole::ALL {
            let path = frame_path(dir.path(), "ETH/USDT", labels.get(role));
            fs::write(&path, format!("{HEADER}1704067200000,10,11,9,10.5,1\n")).unwrap();
        }
        let frames = load_frames(dir.path(), "ETH/USDT", &labels).unwrap();
        assert_eq!(frames.entry.len(), 1);
        assert_eq!(frames.bias[0].high, 11.0);
    }
}
