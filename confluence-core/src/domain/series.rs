//! TimeSeries — chronologically ordered candles for one timeframe.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::candle::Candle;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("candle {index} at {timestamp} is earlier than the candle before it ({previous})")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("candle {index} duplicates timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Candles in strictly increasing timestamp order.
///
/// Insertion order is time order; construction rejects duplicates and
/// out-of-order candles so downstream code can rely on `latest()` being the
/// most recent bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    candles: Vec<Candle>,
}

impl TimeSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, pair) in candles.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if current == previous {
                return Err(SeriesError::DuplicateTimestamp {
                    index: index + 1,
                    timestamp: current,
                });
            }
            if current < previous {
                return Err(SeriesError::OutOfOrder {
                    index: index + 1,
                    timestamp: current,
                    previous,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// The most recent candle.
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The candle `n` bars before the latest (`back(0)` is the latest).
    pub fn back(&self, n: usize) -> Option<&Candle> {
        let len = self.candles.len();
        if n >= len {
            return None;
        }
        self.candles.get(len - 1 - n)
    }
}
