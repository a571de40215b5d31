//! Smoothed Moving Average (SMMA / RMA) of close.
//!
//! SMMA[t] = (SMMA[t-1] * (period - 1) + close[t]) / period, seeded with the SMA
//! of the first `period` closes. Same recurrence as Wilder smoothing.
//! Lookback: period - 1.

use super::atr::wilder_smooth;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Smma {
    period: usize,
    name: String,
}

impl Smma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMMA period must be >= 1");
        Self {
            period,
            name: format!("smma_{period}"),
        }
    }
}

impl Indicator for Smma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        wilder_smooth(&closes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn smma_3_known_values() {
        // Seed at 2: mean(3, 6, 9) = 6
        // [3] = (6 * 2 + 12) / 3 = 8
        // [4] = (8 * 2 + 5) / 3 = 7
        let candles = make_candles(&[3.0, 6.0, 9.0, 12.0, 5.0]);
        let result = Smma::new(3).compute(&candles);
        assert!(result[1].is_nan());
        assert_approx(result[2], 6.0, DEFAULT_EPSILON);
        assert_approx(result[3], 8.0, DEFAULT_EPSILON);
        assert_approx(result[4], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn smma_lags_behind_rising_close() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let result = Smma::new(10).compute(&make_candles(&closes));
        assert!(result[39] < closes[39]);
        assert_eq!(Smma::new(10).name(), "smma_10");
    }
}
