//! Stochastic oscillator (%K / %D).
//!
//! raw %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k)),
//! 50 when the window has zero range.
//! %K = SMA(smooth_k) of raw %K, %D = SMA(d) of %K.
//! Lookback: (k - 1) + (smooth_k - 1), plus (d - 1) for %D.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochLine {
    /// Fast line.
    K,
    /// Slow line.
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k: usize,
    d: usize,
    smooth_k: usize,
    line: StochLine,
    name: String,
}

impl Stochastic {
    pub fn new(k: usize, d: usize, smooth_k: usize, line: StochLine) -> Self {
        assert!(k >= 1, "Stochastic k must be >= 1");
        assert!(d >= 1, "Stochastic d must be >= 1");
        assert!(smooth_k >= 1, "Stochastic smooth_k must be >= 1");
        let prefix = match line {
            StochLine::K => "stoch_k",
            StochLine::D => "stoch_d",
        };
        Self {
            k,
            d,
            smooth_k,
            line,
            name: format!("{prefix}_{k}_{d}_{smooth_k}"),
        }
    }

    fn raw_k(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut raw = vec![f64::NAN; n];
        if n < self.k {
            return raw;
        }
        for i in (self.k - 1)..n {
            let window = &candles[i + 1 - self.k..=i];
            if window.iter().any(|c| c.is_void()) {
                continue;
            }
            let hh = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let ll = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let range = hh - ll;
            raw[i] = if range > 0.0 {
                100.0 * (candles[i].close - ll) / range
            } else {
                50.0
            };
        }
        raw
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k_lookback = (self.k - 1) + (self.smooth_k - 1);
        match self.line {
            StochLine::K => k_lookback,
            StochLine::D => k_lookback + (self.d - 1),
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let k = sma_of_series(&self.raw_k(candles), self.smooth_k);
        match self.line {
            StochLine::K => k,
            StochLine::D => sma_of_series(&k, self.d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn close_at_window_high_reads_near_100() {
        // Rising closes: each close sits 1.0 below its candle high.
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64 * 5.0).collect();
        let candles = make_candles(&closes);
        let k = Stochastic::new(3, 1, 1, StochLine::K).compute(&candles);
        let window = &candles[7..=9];
        let hh = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let ll = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        assert_approx(k[9], 100.0 * (closes[9] - ll) / (hh - ll), DEFAULT_EPSILON);
        assert!(k[9] > 90.0);
    }

    #[test]
    fn flat_window_reads_50() {
        let mut candles = make_candles(&[10.0, 10.0, 10.0]);
        for c in &mut candles {
            c.high = 10.0;
            c.low = 10.0;
        }
        let k = Stochastic::new(3, 1, 1, StochLine::K).compute(&candles);
        assert_approx(k[2], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn d_is_sma_of_k() {
        let closes: Vec<f64> = (0..20).map(|i| 50.0 + (i as f64).sin() * 3.0).collect();
        let candles = make_candles(&closes);
        let k = Stochastic::new(5, 3, 2, StochLine::K).compute(&candles);
        let d = Stochastic::new(5, 3, 2, StochLine::D).compute(&candles);
        assert!(d[6].is_nan());
        assert_approx(d[7], (k[5] + k[6] + k[7]) / 3.0, DEFAULT_EPSILON);
        assert_approx(d[8], (k[6] + k[7] + k[8]) / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lookback_accounts_for_smoothing() {
        assert_eq!(Stochastic::new(14, 3, 3, StochLine::K).lookback(), 15);
        assert_eq!(Stochastic::new(14, 3, 3, StochLine::D).lookback(), 17);
    }
}
