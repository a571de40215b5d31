//! Directional stance, trade direction and timeframe roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional stance derived from the highest analyzed timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    Neutral,
    Bullish,
    Bearish,
}

impl Bias {
    /// Trade direction implied by the bias, `None` for `Neutral`.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Bias::Neutral => None,
            Bias::Bullish => Some(Direction::Long),
            Bias::Bearish => Some(Direction::Short),
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Neutral => write!(f, "NEUTRAL"),
            Bias::Bullish => write!(f, "BULLISH"),
            Bias::Bearish => write!(f, "BEARISH"),
        }
    }
}

/// Direction of a trade signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// The four timeframes fused by the scorer, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeframeRole {
    Bias,
    Confirmation,
    Pattern,
    Entry,
}

impl TimeframeRole {
    pub const ALL: [TimeframeRole; 4] = [
        TimeframeRole::Bias,
        TimeframeRole::Confirmation,
        TimeframeRole::Pattern,
        TimeframeRole::Entry,
    ];
}

impl fmt::Display for TimeframeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeframeRole::Bias => write!(f, "bias"),
            TimeframeRole::Confirmation => write!(f, "confirmation"),
            TimeframeRole::Pattern => write!(f, "pattern"),
            TimeframeRole::Entry => write!(f, "entry"),
        }
    }
}
