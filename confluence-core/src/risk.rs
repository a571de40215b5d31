//! Risk/reward validation: turn a candidate into a priced signal or reject it.
//!
//! Stops sit beyond the opposite Fibonacci anchor, buffered by a multiple of
//! ATR. Targets come from the Fibonacci set: the 0.618 retracement and the
//! anchor on the trade side normally, or the two extensions once price has
//! already broken past that anchor.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ScannerConfig;
use crate::domain::Direction;
use crate::scoring::CandidateSignal;
use crate::swing::FibLevels;

/// A candidate with a complete stop/target plan that cleared the minimum ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedSignal {
    #[serde(flatten)]
    pub candidate: CandidateSignal,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    /// Reward to TP1 divided by risk to the stop.
    pub rr_ratio: f64,
}

/// Why a candidate did not become a priced signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// The candidate carries no Fibonacci levels.
    InsufficientFib,
    /// Entry sits exactly on the stop.
    ZeroRisk,
    RatioBelowMinimum { ratio: f64, minimum: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InsufficientFib => write!(f, "no fibonacci levels"),
            Rejection::ZeroRisk => write!(f, "risk is zero"),
            Rejection::RatioBelowMinimum { ratio, minimum } => {
                write!(f, "R:R {ratio:.2} below minimum {minimum:.2}")
            }
        }
    }
}

/// Stop and target prices before the ratio check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    /// Targets were switched to the extensions.
    pub breakout: bool,
}

/// Stop/target placement for `direction` entering at `entry`.
///
/// # Formula
/// ```text
/// long:  stop = low  - atr * multiplier
/// short: stop = high + atr * multiplier
/// targets = (retracement 0.618, high|low)
///        or (extension 1.272, extension 1.618) when entry is strictly past high|low
/// ```
pub fn place_levels(
    direction: Direction,
    entry: f64,
    fib: &FibLevels,
    atr: f64,
    multiplier: f64,
) -> Levels {
    let buffer = atr * multiplier;
    let (stop_loss, anchor, breakout) = match direction {
        Direction::Long => (fib.low - buffer, fib.high, entry > fib.high),
        Direction::Short => (fib.high + buffer, fib.low, entry < fib.low),
    };
    let (take_profit_1, take_profit_2) = if breakout {
        (fib.extension_1272, fib.extension_1618)
    } else {
        (fib.retracement_618, anchor)
    };
    Levels {
        stop_loss,
        take_profit_1,
        take_profit_2,
        breakout,
    }
}

/// Accepts or rejects candidates on reward-to-risk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskValidator {
    min_rr_ratio: f64,
    atr_multiplier: f64,
}

impl RiskValidator {
    pub fn new(min_rr_ratio: f64, atr_multiplier: f64) -> Self {
        Self {
            min_rr_ratio,
            atr_multiplier,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.strategy.min_rr_ratio,
            config.risk.atr_buffer_multiplier,
        )
    }

    pub fn min_rr_ratio(&self) -> f64 {
        self.min_rr_ratio
    }

    /// Price the candidate, or say why it fails.
    pub fn validate(&self, candidate: CandidateSignal, atr: f64) -> Result<PricedSignal, Rejection> {
        let fib = *candidate.fib.levels().ok_or(Rejection::InsufficientFib)?;
        let entry = candidate.entry_price;
        let levels = place_levels(candidate.direction, entry, &fib, atr, self.atr_multiplier);
        if levels.breakout {
            tracing::debug!(
                symbol = %candidate.symbol,
                entry,
                "breakout past swing anchor, targeting extensions"
            );
        }

        let risk = (entry - levels.stop_loss).abs();
        if risk == 0.0 {
            return Err(Rejection::ZeroRisk);
        }
        let reward = (levels.take_profit_1 - entry).abs();
        let rr_ratio = reward / risk;
        // NaN from a non-finite atr or entry must fail too.
        if !(rr_ratio >= self.min_rr_ratio) {
            return Err(Rejection::RatioBelowMinimum {
                ratio: rr_ratio,
                minimum: self.min_rr_ratio,
            });
        }

        Ok(PricedSignal {
            candidate,
            stop_loss: levels.stop_loss,
            take_profit_1: levels.take_profit_1,
            take_profit_2: levels.take_profit_2,
            rr_ratio,
        })
    }

    /// [`validate`](Self::validate) without the reason.
    pub fn calculate_sl_tp(&self, candidate: CandidateSignal, atr: f64) -> Option<PricedSignal> {
        self.validate(candidate, atr).ok()
    }
}
