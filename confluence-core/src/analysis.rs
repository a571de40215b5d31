//! Multi-timeframe analysis: raw candles per role in, validated snapshot out.
//!
//! The snapshot is the only input the scorer sees. Building it is where
//! malformed data is caught: unordered candles, a too-short entry series, or
//! indicator values still in warmup on a candle the scorer will read all fail
//! here with an [`AnalysisError`] instead of leaking NaN into the rubric.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Bias, Candle, SeriesError, TimeSeries, TimeframeRole};
use crate::indicators::{enrich, IndicatorParams};
use crate::swing::{fibonacci_for, FibSetup};

/// Entry candles needed for the two-back trigger comparison.
pub const MIN_ENTRY_CANDLES: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{role} series: {source}")]
    Series {
        role: TimeframeRole,
        #[source]
        source: SeriesError,
    },

    #[error("{role} series is empty")]
    EmptySeries { role: TimeframeRole },

    #[error("entry series has {len} candles, need at least {MIN_ENTRY_CANDLES}")]
    EntryTooShort { len: usize },

    #[error("{role} candle at {timestamp} has no `{field}` value (indicator warmup not complete)")]
    IndicatorWarmup {
        role: TimeframeRole,
        field: &'static str,
        timestamp: DateTime<Utc>,
    },

    #[error("current price {0} is not a positive number")]
    InvalidPrice(f64),
}

/// One value per timeframe role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ByRole<T> {
    pub bias: T,
    pub confirmation: T,
    pub pattern: T,
    pub entry: T,
}

impl<T> ByRole<T> {
    pub fn get(&self, role: TimeframeRole) -> &T {
        match role {
            TimeframeRole::Bias => &self.bias,
            TimeframeRole::Confirmation => &self.confirmation,
            TimeframeRole::Pattern => &self.pattern,
            TimeframeRole::Entry => &self.entry,
        }
    }

    /// Apply a fallible conversion to every role, stopping at the first error.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(TimeframeRole, T) -> Result<U, E>,
    ) -> Result<ByRole<U>, E> {
        Ok(ByRole {
            bias: f(TimeframeRole::Bias, self.bias)?,
            confirmation: f(TimeframeRole::Confirmation, self.confirmation)?,
            pattern: f(TimeframeRole::Pattern, self.pattern)?,
            entry: f(TimeframeRole::Entry, self.entry)?,
        })
    }
}

/// Raw candles per role, as loaded from the data source.
pub type RawFrames = ByRole<Vec<Candle>>;

/// Everything the scorer needs for one symbol at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    symbol: String,
    bias: Bias,
    current_price: f64,
    series: ByRole<TimeSeries>,
    latest: ByRole<Candle>,
    entry_two_back: Candle,
    fib: FibSetup,
}

impl Snapshot {
    /// Assemble and validate a snapshot.
    ///
    /// Indicator fields are only checked when the bias is directional, since a
    /// neutral snapshot is rejected before any of them are read.
    pub fn new(
        symbol: impl Into<String>,
        bias: Bias,
        current_price: f64,
        series: ByRole<TimeSeries>,
        fib: FibSetup,
    ) -> Result<Self, AnalysisError> {
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(AnalysisError::InvalidPrice(current_price));
        }

        let latest = series.clone().try_map(|role, s| {
            s.latest()
                .cloned()
                .ok_or(AnalysisError::EmptySeries { role })
        })?;
        let entry_two_back = series
            .entry
            .back(2)
            .cloned()
            .ok_or(AnalysisError::EntryTooShort {
                len: series.entry.len(),
            })?;

        let snapshot = Self {
            symbol: symbol.into(),
            bias,
            current_price,
            series,
            latest,
            entry_two_back,
            fib,
        };
        if bias != Bias::Neutral {
            snapshot.check_scored_fields()?;
        }
        Ok(snapshot)
    }

    fn check_scored_fields(&self) -> Result<(), AnalysisError> {
        let b = &self.latest.bias;
        let c = &self.latest.confirmation;
        let e = &self.latest.entry;
        let prev = &self.entry_two_back;
        let checks: [(TimeframeRole, &Candle, &[(&'static str, f64)]); 4] = [
            (
                TimeframeRole::Bias,
                b,
                &[
                    ("ema_fast", b.indicators.ema_fast),
                    ("ema_slow", b.indicators.ema_slow),
                    ("smma", b.indicators.smma),
                ],
            ),
            (
                TimeframeRole::Confirmation,
                c,
                &[
                    ("macd", c.indicators.macd),
                    ("macd_signal", c.indicators.macd_signal),
                ],
            ),
            (
                TimeframeRole::Entry,
                e,
                &[
                    ("stoch_k", e.indicators.stoch_k),
                    ("stoch_d", e.indicators.stoch_d),
                    ("macd", e.indicators.macd),
                    ("macd_signal", e.indicators.macd_signal),
                    ("atr", e.indicators.atr),
                ],
            ),
            (
                TimeframeRole::Entry,
                prev,
                &[
                    ("stoch_k", prev.indicators.stoch_k),
                    ("stoch_d", prev.indicators.stoch_d),
                ],
            ),
        ];

        for (role, candle, fields) in checks {
            if let Some(&(field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
                return Err(AnalysisError::IndicatorWarmup {
                    role,
                    field,
                    timestamp: candle.timestamp,
                });
            }
        }
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bias(&self) -> Bias {
        self.bias
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn series(&self, role: TimeframeRole) -> &TimeSeries {
        self.series.get(role)
    }

    /// Latest candle of a role's series.
    pub fn latest(&self, role: TimeframeRole) -> &Candle {
        self.latest.get(role)
    }

    /// Entry candle two bars before the latest.
    pub fn entry_two_back(&self) -> &Candle {
        &self.entry_two_back
    }

    /// Fibonacci levels from the bias timeframe.
    pub fn fib(&self) -> &FibSetup {
        &self.fib
    }

    /// Volatility used for the stop buffer: ATR of the latest entry candle.
    pub fn entry_atr(&self) -> f64 {
        self.latest.entry.indicators.atr
    }
}

/// Trend stance from the bias timeframe's latest candle.
///
/// Bullish when price is above the long trend EMA and the short trend EMA is
/// above the long one; Bearish on the mirror; Neutral otherwise.
pub fn derive_bias(candle: &Candle) -> Bias {
    let close = candle.close;
    let short = candle.indicators.ema_trend_short;
    let long = candle.indicators.ema_trend_long;
    if close > long && short > long {
        Bias::Bullish
    } else if close < long && short < long {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Turns raw multi-timeframe candles into a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct Analyzer {
    params: IndicatorParams,
}

impl Analyzer {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn analyze(
        &self,
        symbol: &str,
        raw: RawFrames,
        current_price: f64,
    ) -> Result<Snapshot, AnalysisError> {
        let series = raw.try_map(|role, candles| {
            enrich(candles, &self.params).map_err(|source| AnalysisError::Series { role, source })
        })?;

        let bias_candle = series
            .bias
            .latest()
            .ok_or(AnalysisError::EmptySeries {
                role: TimeframeRole::Bias,
            })?;
        for (field, value) in [
            ("ema_trend_short", bias_candle.indicators.ema_trend_short),
            ("ema_trend_long", bias_candle.indicators.ema_trend_long),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::IndicatorWarmup {
                    role: TimeframeRole::Bias,
                    field,
                    timestamp: bias_candle.timestamp,
                });
            }
        }
        let bias = derive_bias(bias_candle);
        let fib = fibonacci_for(series.bias.candles());

        tracing::debug!(
            symbol,
            %bias,
            fib_ready = fib.is_ready(),
            bias_candles = series.bias.len(),
            entry_candles = series.entry.len(),
            "multi-timeframe analysis complete"
        );
        Snapshot::new(symbol, bias, current_price, series, fib)
    }
}
