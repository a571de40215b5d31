//! Moving Average Convergence Divergence (MACD).
//!
//! Line = EMA(fast) - EMA(slow) of close; signal = EMA(signal) of the line.
//! The two outputs are separate indicator instances selected by [`MacdLine`].
//! Lookback: slow - 1 for the line, plus signal - 1 for the signal line.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1, "MACD fast period must be >= 1");
        assert!(slow > fast, "MACD slow period must be > fast period");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        let prefix = match line {
            MacdLine::Line => "macd",
            MacdLine::Signal => "macd_signal",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{prefix}_{fast}_{slow}_{signal}"),
        }
    }
}

/// MACD line from raw closes.
fn macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect()
}

/// EMA of a series that starts with a NaN warmup prefix.
fn ema_after_warmup(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if let Some(start) = values.iter().position(|v| !v.is_nan()) {
        let tail = ema_of_series(&values[start..], period);
        result[start..].copy_from_slice(&tail);
    }
    result
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Line => self.slow - 1,
            MacdLine::Signal => self.slow - 1 + self.signal - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let line = macd_line(&closes, self.fast, self.slow);
        match self.line {
            MacdLine::Line => line,
            MacdLine::Signal => ema_after_warmup(&line, self.signal),
        }
    }
}
