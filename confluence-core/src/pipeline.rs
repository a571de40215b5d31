//! Signal pipeline: one snapshot through every gate to an accepted signal.
//!
//! ```text
//! snapshot -> [bias directional] -> score -> [score >= min] -> candidate
//!          -> [fib ready] -> stop/targets -> [risk != 0] -> [ratio >= min] -> accepted
//! ```
//!
//! Linear, no retries. The first failing gate ends the run.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::analysis::Snapshot;
use crate::config::{ConfigError, ScannerConfig};
use crate::risk::{PricedSignal, Rejection, RiskValidator};
use crate::scoring::{ConfluenceScorer, ScoreShortfall};

/// The gate a snapshot failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    NeutralBias,
    ScoreBelowMinimum { score: f64, minimum: f64 },
    InsufficientFib,
    ZeroRisk,
    RatioBelowMinimum { ratio: f64, minimum: f64 },
}

impl From<ScoreShortfall> for Gate {
    fn from(s: ScoreShortfall) -> Self {
        match s {
            ScoreShortfall::NeutralBias => Gate::NeutralBias,
            ScoreShortfall::BelowMinimum { score, minimum } => {
                Gate::ScoreBelowMinimum { score, minimum }
            }
        }
    }
}

impl From<Rejection> for Gate {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::InsufficientFib => Gate::InsufficientFib,
            Rejection::ZeroRisk => Gate::ZeroRisk,
            Rejection::RatioBelowMinimum { ratio, minimum } => {
                Gate::RatioBelowMinimum { ratio, minimum }
            }
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::NeutralBias => write!(f, "bias is neutral"),
            Gate::ScoreBelowMinimum { score, minimum } => {
                write!(f, "score {score:.1} below minimum {minimum:.1}")
            }
            Gate::InsufficientFib => write!(f, "no fibonacci levels"),
            Gate::ZeroRisk => write!(f, "risk is zero"),
            Gate::RatioBelowMinimum { ratio, minimum } => {
                write!(f, "R:R {ratio:.2} below minimum {minimum:.2}")
            }
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted(PricedSignal),
    NoSignal(Gate),
}

impl Outcome {
    pub fn signal(&self) -> Option<&PricedSignal> {
        match self {
            Outcome::Accepted(signal) => Some(signal),
            Outcome::NoSignal(_) => None,
        }
    }

    pub fn into_signal(self) -> Option<PricedSignal> {
        match self {
            Outcome::Accepted(signal) => Some(signal),
            Outcome::NoSignal(_) => None,
        }
    }
}

/// Scorer and validator wired together.
#[derive(Debug, Clone)]
pub struct SignalPipeline {
    scorer: ConfluenceScorer,
    validator: RiskValidator,
}

impl SignalPipeline {
    pub fn new(scorer: ConfluenceScorer, validator: RiskValidator) -> Self {
        Self { scorer, validator }
    }

    pub fn from_config(config: &ScannerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            ConfluenceScorer::from_config(config)?,
            RiskValidator::from_config(config),
        ))
    }

    pub fn run(&self, snapshot: &Snapshot) -> Outcome {
        self.run_at(snapshot, Utc::now())
    }

    /// Run with an explicit signal generation time.
    pub fn run_at(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Outcome {
        match self.try_run(snapshot, now) {
            Ok(signal) => {
                tracing::info!(
                    symbol = %signal.candidate.symbol,
                    direction = %signal.candidate.direction,
                    rr = signal.rr_ratio,
                    "signal accepted"
                );
                Outcome::Accepted(signal)
            }
            Err(gate) => {
                match gate {
                    Gate::InsufficientFib | Gate::ZeroRisk => {
                        tracing::warn!(symbol = snapshot.symbol(), %gate, "signal rejected");
                    }
                    _ => tracing::info!(symbol = snapshot.symbol(), %gate, "no signal"),
                }
                Outcome::NoSignal(gate)
            }
        }
    }

    fn try_run(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<PricedSignal, Gate> {
        let candidate = self.scorer.assess_at(snapshot, now)?;
        let signal = self.validator.validate(candidate, snapshot.entry_atr())?;
        Ok(signal)
    }
}
