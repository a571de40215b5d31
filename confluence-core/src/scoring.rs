//! Confluence scoring: fuse four timeframes into one directional candidate.
//!
//! The rubric is additive. Each satisfied condition adds a fixed number of
//! points and appends one label; nothing is ever subtracted. Conditions are
//! written for the bias direction, so a bearish snapshot is scored on the
//! mirror image of the bullish rules.
//!
//! | Tier | Timeframe    | Max | Conditions (bullish)                                  |
//! |------|--------------|-----|-------------------------------------------------------|
//! | 1    | bias         | 4   | +2 directional bias, +1 fast EMA > slow EMA, +1 close > SMMA |
//! | 2    | confirmation | 3   | +2 close in the top 40% of the range, +1 MACD > signal |
//! | 3    | pattern      | 1   | +1 close > open                                       |
//! | 4    | entry        | 2   | +2 %K crosses above %D (vs two bars back) with MACD > signal |

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Snapshot;
use crate::config::{ConfigError, ScannerConfig, TimeframeLabels, MAX_SCORE};
use crate::domain::{Candle, Direction, TimeframeRole};
use crate::indicators::IndicatorParams;
use crate::swing::FibSetup;

const BIAS_POINTS: f64 = 2.0;
const EMA_POINTS: f64 = 1.0;
const SMMA_POINTS: f64 = 1.0;
const WICK_POINTS: f64 = 2.0;
const MACD_POINTS: f64 = 1.0;
const PATTERN_POINTS: f64 = 1.0;
const TRIGGER_POINTS: f64 = 2.0;

/// Share of the bar range the close must clear from the opposite extreme.
const WICK_REJECTION_SHARE: f64 = 0.6;

/// A directional signal that cleared the score threshold but has no
/// stop/target plan yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSignal {
    pub symbol: String,
    pub direction: Direction,
    /// Current traded price at evaluation time.
    pub entry_price: f64,
    pub score: f64,
    pub confluence: Vec<String>,
    pub fib: FibSetup,
    pub generated_at: DateTime<FixedOffset>,
}

/// Score and justification for one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scorecard {
    pub score: f64,
    pub points: Vec<String>,
}

impl Scorecard {
    fn award(&mut self, points: f64, label: String) {
        self.score += points;
        self.points.push(label);
    }
}

/// Label text for each rubric condition.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricLabels {
    bias_tf: String,
    confirmation_tf: String,
    pattern_tf: String,
    entry_tf: String,
    ema_fast: usize,
    ema_slow: usize,
    smma: usize,
}

impl RubricLabels {
    pub fn new(timeframes: &TimeframeLabels, params: &IndicatorParams) -> Self {
        Self {
            bias_tf: timeframes.display(TimeframeRole::Bias),
            confirmation_tf: timeframes.display(TimeframeRole::Confirmation),
            pattern_tf: timeframes.display(TimeframeRole::Pattern),
            entry_tf: timeframes.display(TimeframeRole::Entry),
            ema_fast: params.ema_fast,
            ema_slow: params.ema_slow,
            smma: params.smma,
        }
    }

    fn bias(&self, dir: Direction) -> String {
        format!("{} Bias: {}", self.bias_tf, side_title(dir))
    }

    fn ema(&self, dir: Direction) -> String {
        let cross = match dir {
            Direction::Long => "Golden",
            Direction::Short => "Death",
        };
        format!("{} EMA {}/{}: {cross}", self.bias_tf, self.ema_fast, self.ema_slow)
    }

    fn smma(&self, dir: Direction) -> String {
        format!("{} Price {} SMMA{}", self.bias_tf, comparator(dir), self.smma)
    }

    fn wick(&self, dir: Direction) -> String {
        format!("{} Rejection: {} Wick", self.confirmation_tf, side_title(dir))
    }

    fn macd(&self, dir: Direction) -> String {
        format!("{} MACD: {}", self.confirmation_tf, side_title(dir))
    }

    fn pattern(&self, dir: Direction) -> String {
        format!("{} Pattern: {} Candle", self.pattern_tf, side_title(dir))
    }

    fn trigger(&self, dir: Direction) -> String {
        format!("{} Trigger: Stoch & MACD {} Cross", self.entry_tf, side_title(dir))
    }
}

impl Default for RubricLabels {
    fn default() -> Self {
        Self::new(&TimeframeLabels::default(), &IndicatorParams::default())
    }
}

fn side_title(dir: Direction) -> &'static str {
    match dir {
        Direction::Long => "Bullish",
        Direction::Short => "Bearish",
    }
}

fn comparator(dir: Direction) -> &'static str {
    match dir {
        Direction::Long => ">",
        Direction::Short => "<",
    }
}

/// `a` is strictly on the favourable side of `b` for `dir`.
fn favours(dir: Direction, a: f64, b: f64) -> bool {
    match dir {
        Direction::Long => a > b,
        Direction::Short => a < b,
    }
}

/// Close sits in the outer share of the range away from the rejected extreme.
fn wick_rejection(dir: Direction, c: &Candle) -> bool {
    let travelled = match dir {
        Direction::Long => c.close - c.low,
        Direction::Short => c.high - c.close,
    };
    travelled > WICK_REJECTION_SHARE * c.range()
}

/// %K crossed %D in `dir` between `prev` and `latest`, confirmed by MACD on `latest`.
fn entry_trigger(dir: Direction, latest: &Candle, prev: &Candle) -> bool {
    let now = &latest.indicators;
    let before = &prev.indicators;
    favours(dir, now.stoch_k, now.stoch_d)
        && !favours(dir, before.stoch_k, before.stoch_d)
        && favours(dir, now.macd, now.macd_signal)
}

/// Why a snapshot produced no candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreShortfall {
    NeutralBias,
    BelowMinimum { score: f64, minimum: f64 },
}

/// Applies the rubric and the score threshold.
#[derive(Debug, Clone)]
pub struct ConfluenceScorer {
    min_score: f64,
    labels: RubricLabels,
    offset: FixedOffset,
}

impl ConfluenceScorer {
    pub fn new(min_score: f64, labels: RubricLabels, offset: FixedOffset) -> Self {
        Self {
            min_score,
            labels,
            offset,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.strategy.min_confluence_score,
            RubricLabels::new(&config.timeframes, &config.indicators),
            config.display_offset()?,
        ))
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Run the rubric. `None` when the bias is neutral.
    pub fn score(&self, snapshot: &Snapshot) -> Option<Scorecard> {
        let dir = snapshot.bias().direction()?;
        let labels = &self.labels;
        let mut card = Scorecard::default();

        // Tier 1: bias timeframe
        let bias = snapshot.latest(TimeframeRole::Bias);
        card.award(BIAS_POINTS, labels.bias(dir));
        if favours(dir, bias.indicators.ema_fast, bias.indicators.ema_slow) {
            card.award(EMA_POINTS, labels.ema(dir));
        }
        if favours(dir, bias.close, bias.indicators.smma) {
            card.award(SMMA_POINTS, labels.smma(dir));
        }

        // Tier 2: confirmation timeframe
        let conf = snapshot.latest(TimeframeRole::Confirmation);
        if wick_rejection(dir, conf) {
            card.award(WICK_POINTS, labels.wick(dir));
        }
        if favours(dir, conf.indicators.macd, conf.indicators.macd_signal) {
            card.award(MACD_POINTS, labels.macd(dir));
        }

        // Tier 3: pattern timeframe
        let pattern = snapshot.latest(TimeframeRole::Pattern);
        if favours(dir, pattern.close, pattern.open) {
            card.award(PATTERN_POINTS, labels.pattern(dir));
        }

        // Tier 4: entry timeframe
        let entry = snapshot.latest(TimeframeRole::Entry);
        if entry_trigger(dir, entry, snapshot.entry_two_back()) {
            card.award(TRIGGER_POINTS, labels.trigger(dir));
        }

        debug_assert!(card.score <= MAX_SCORE);
        Some(card)
    }

    /// Score the snapshot and emit a candidate if it clears the threshold.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Option<CandidateSignal> {
        self.evaluate_at(snapshot, Utc::now())
    }

    /// [`evaluate`](Self::evaluate) with an explicit generation time.
    pub fn evaluate_at(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Option<CandidateSignal> {
        self.assess_at(snapshot, now).ok()
    }

    /// Like [`evaluate_at`](Self::evaluate_at), but says why no candidate was produced.
    pub fn assess_at(
        &self,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
    ) -> Result<CandidateSignal, ScoreShortfall> {
        let (Some(dir), Some(card)) = (snapshot.bias().direction(), self.score(snapshot)) else {
            tracing::info!(symbol = snapshot.symbol(), "evaluation skipped: bias is NEUTRAL");
            return Err(ScoreShortfall::NeutralBias);
        };
        tracing::info!(
            symbol = snapshot.symbol(),
            bias = %snapshot.bias(),
            score = card.score,
            "final confluence score {:.2}/10",
            card.score
        );
        tracing::debug!(points = ?card.points, "confluence points");

        if card.score < self.min_score {
            return Err(ScoreShortfall::BelowMinimum {
                score: card.score,
                minimum: self.min_score,
            });
        }
        tracing::info!(%dir, "score threshold met, generating candidate");
        Ok(CandidateSignal {
            symbol: snapshot.symbol().to_string(),
            direction: dir,
            entry_price: snapshot.current_price(),
            score: card.score,
            confluence: card.points,
            fib: *snapshot.fib(),
            generated_at: now.with_timezone(&self.offset),
        })
    }
}
