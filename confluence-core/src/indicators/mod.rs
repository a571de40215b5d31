//! Indicator computation over candle series.
//!
//! Every indicator implements [`Indicator`]: candle history in, numeric series
//! of the same length out, NaN during warmup. Multi-series indicators (MACD,
//! Stochastic) are exposed as one instance per line so the trait stays
//! single-series.
//!
//! [`enrich`] runs the full set configured by [`IndicatorParams`] once per
//! series and writes the results into each candle's typed
//! [`IndicatorFields`](crate::domain::IndicatorFields).

pub mod atr;
pub mod ema;
pub mod macd;
pub mod sma;
pub mod smma;
pub mod stochastic;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use smma::Smma;
pub use stochastic::{StochLine, Stochastic};

use crate::domain::{Candle, SeriesError, TimeSeries};
use serde::{Deserialize, Serialize};

/// Trait for indicators.
///
/// # Look-ahead guard
/// No value at index t may depend on candles after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_50", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `candles`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticParams {
    pub k: usize,
    pub d: usize,
    pub smooth_k: usize,
}

/// Indicator lengths. Doubles as the `[indicators]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_trend_short: usize,
    pub ema_trend_long: usize,
    pub smma: usize,
    pub atr: usize,
    pub macd: MacdParams,
    pub stochastic: StochasticParams,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 50,
            ema_slow: 200,
            ema_trend_short: 21,
            ema_trend_long: 55,
            smma: 28,
            atr: 14,
            macd: MacdParams {
                fast: 12,
                slow: 26,
                signal: 9,
            },
            stochastic: StochasticParams {
                k: 14,
                d: 3,
                smooth_k: 3,
            },
        }
    }
}

impl IndicatorParams {
    /// Longest warmup across the configured indicators.
    pub fn max_lookback(&self) -> usize {
        self.indicators()
            .iter()
            .map(|(_, ind)| ind.lookback())
            .max()
            .unwrap_or(0)
    }

    fn indicators(&self) -> Vec<(Slot, Box<dyn Indicator>)> {
        let m = self.macd;
        let s = self.stochastic;
        vec![
            (Slot::EmaFast, Box::new(Ema::new(self.ema_fast))),
            (Slot::EmaSlow, Box::new(Ema::new(self.ema_slow))),
            (Slot::EmaTrendShort, Box::new(Ema::new(self.ema_trend_short))),
            (Slot::EmaTrendLong, Box::new(Ema::new(self.ema_trend_long))),
            (Slot::Smma, Box::new(Smma::new(self.smma))),
            (
                Slot::Macd,
                Box::new(Macd::new(m.fast, m.slow, m.signal, MacdLine::Line)),
            ),
            (
                Slot::MacdSignal,
                Box::new(Macd::new(m.fast, m.slow, m.signal, MacdLine::Signal)),
            ),
            (
                Slot::StochK,
                Box::new(Stochastic::new(s.k, s.d, s.smooth_k, StochLine::K)),
            ),
            (
                Slot::StochD,
                Box::new(Stochastic::new(s.k, s.d, s.smooth_k, StochLine::D)),
            ),
            (Slot::Atr, Box::new(Atr::new(self.atr))),
        ]
    }
}

/// Which `IndicatorFields` field a computed series lands in.
#[derive(Debug, Clone, Copy)]
enum Slot {
    EmaFast,
    EmaSlow,
    EmaTrendShort,
    EmaTrendLong,
    Smma,
    Macd,
    MacdSignal,
    StochK,
    StochD,
    Atr,
}

/// Compute every configured indicator over `candles` and attach the values.
///
/// Fails if the candles are not in strictly increasing timestamp order.
pub fn enrich(candles: Vec<Candle>, params: &IndicatorParams) -> Result<TimeSeries, SeriesError> {
    let series = TimeSeries::new(candles)?;
    let computed: Vec<(Slot, Vec<f64>)> = params
        .indicators()
        .into_iter()
        .map(|(slot, ind)| (slot, ind.compute(series.candles())))
        .collect();

    let mut candles = series.into_candles();
    for (slot, values) in computed {
        for (candle, value) in candles.iter_mut().zip(values) {
            let fields = &mut candle.indicators;
            let target = match slot {
                Slot::EmaFast => &mut fields.ema_fast,
                Slot::EmaSlow => &mut fields.ema_slow,
                Slot::EmaTrendShort => &mut fields.ema_trend_short,
                Slot::EmaTrendLong => &mut fields.ema_trend_long,
                Slot::Smma => &mut fields.smma,
                Slot::Macd => &mut fields.macd,
                Slot::MacdSignal => &mut fields.macd_signal,
                Slot::StochK => &mut fields.stoch_k,
                Slot::StochD => &mut fields.stoch_d,
                Slot::Atr => &mut fields.atr,
            };
            *target = value;
        }
    }
    TimeSeries::new(candles)
}

/// Synthetic candles from close prices for testing.
///
/// open = previous close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, 15-minute spacing.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                base + chrono::Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
