//! Candle — one OHLCV bar plus the indicator values computed over its series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Indicator values attached to a candle.
///
/// Every field is `f64::NAN` until `indicators::enrich` fills it, and stays NaN
/// for candles inside an indicator's warmup window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFields {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub ema_trend_short: f64,
    pub ema_trend_long: f64,
    /// Smoothed (Wilder) moving average of close.
    pub smma: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub atr: f64,
}

impl Default for IndicatorFields {
    fn default() -> Self {
        Self {
            ema_fast: f64::NAN,
            ema_slow: f64::NAN,
            ema_trend_short: f64::NAN,
            ema_trend_long: f64::NAN,
            smma: f64::NAN,
            macd: f64::NAN,
            macd_signal: f64::NAN,
            stoch_k: f64::NAN,
            stoch_d: f64::NAN,
            atr: f64::NAN,
        }
    }
}

impl IndicatorFields {
    /// Field names paired with their values, in declaration order.
    pub fn named(&self) -> [(&'static str, f64); 10] {
        [
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("ema_trend_short", self.ema_trend_short),
            ("ema_trend_long", self.ema_trend_long),
            ("smma", self.smma),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("stoch_k", self.stoch_k),
            ("stoch_d", self.stoch_d),
            ("atr", self.atr),
        ]
    }

    /// Name of the first field that is not a finite number, if any.
    pub fn first_missing(&self) -> Option<&'static str> {
        self.named()
            .into_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(name, _)| name)
    }
}

/// OHLCV bar for one symbol on one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub indicators: IndicatorFields,
}

impl Candle {
    /// A raw candle with no indicator values yet.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            indicators: IndicatorFields::default(),
        }
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high is the max and low is the min of the bar.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Full high-low range of the bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
