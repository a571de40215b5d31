//! Exponential moving average of close.
//!
//! The first value (at index `period - 1`) is the simple mean of the first
//! `period` closes; after that `ema = prev + alpha * (close - prev)` with
//! `alpha = 2 / (period + 1)`.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA over a raw value slice, seeded at the first `period` values.
///
/// A NaN inside the seed window leaves the whole output NaN; a NaN after it
/// stops the recursion there. MACD runs this over its own line, which is
/// NaN for the first `slow - 1` entries, so it calls it on the finite tail.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let (seed_window, rest) = values.split_at(period);
    if seed_window.iter().any(|v| v.is_nan()) {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed_window.iter().sum::<f64>() / period as f64;
    out[period - 1] = prev;
    for (slot, &x) in out[period..].iter_mut().zip(rest) {
        if x.is_nan() {
            break;
        }
        prev += alpha * (x - prev);
        *slot = prev;
    }
    out
}
