//! Swing-point detection and Fibonacci level derivation.
//!
//! A swing HIGH is a candle whose high strictly exceeds the highs of the two
//! candles on each side (5-candle fractal); a swing LOW mirrors this on lows.
//! The two candles at each edge of a series can never be swings.
//!
//! Fibonacci levels are anchored on the most recent swing of each kind. The
//! trend tag comes from which of the two swings is more recent in time, not
//! from where price sits relative to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Candles on each side a swing must beat.
const FRACTAL_WING: usize = 2;

pub const RETRACEMENT_RATIOS: [f64; 3] = [0.382, 0.5, 0.618];
pub const EXTENSION_RATIOS: [f64; 2] = [1.272, 1.618];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

/// Swing label for one candle, aligned with the input series.
///
/// At most one side is set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwingLabel {
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl SwingLabel {
    pub fn is_swing(&self) -> bool {
        self.high.is_some() || self.low.is_some()
    }
}

/// Candle indices that have a full wing on both sides.
fn interior(n: usize) -> std::ops::Range<usize> {
    if n < 2 * FRACTAL_WING + 1 {
        return 0..0;
    }
    FRACTAL_WING..n - FRACTAL_WING
}

/// Whether candle `i` clears its wing as a high and as a low.
fn fractal(candles: &[Candle], i: usize) -> (bool, bool) {
    let neighbours = (i - FRACTAL_WING..=i + FRACTAL_WING).filter(|&j| j != i);
    let high = candles[i].high;
    let low = candles[i].low;
    let is_high = neighbours.clone().all(|j| high > candles[j].high);
    let is_low = neighbours.into_iter().all(|j| low < candles[j].low);
    (is_high, is_low)
}

/// Label every candle with its swing high/low, if any.
///
/// An outside bar can clear both tests; its label keeps only the high.
/// [`swing_points`] still reports both anchors for it.
pub fn detect_swings(candles: &[Candle]) -> Vec<SwingLabel> {
    let mut labels = vec![SwingLabel::default(); candles.len()];
    for i in interior(candles.len()) {
        match fractal(candles, i) {
            (true, _) => labels[i].high = Some(candles[i].high),
            (false, true) => labels[i].low = Some(candles[i].low),
            (false, false) => {}
        }
    }
    labels
}

/// Every swing high and low in time order. An outside bar yields one of each.
pub fn swing_points(candles: &[Candle]) -> Vec<SwingPoint> {
    let mut points = Vec::new();
    for i in interior(candles.len()) {
        let (is_high, is_low) = fractal(candles, i);
        let candle = &candles[i];
        if is_high {
            points.push(SwingPoint {
                timestamp: candle.timestamp,
                price: candle.high,
                kind: SwingKind::High,
            });
        }
        if is_low {
            points.push(SwingPoint {
                timestamp: candle.timestamp,
                price: candle.low,
                kind: SwingKind::Low,
            });
        }
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

/// Retracement and extension levels for one high/low anchor pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevels {
    pub high: f64,
    pub low: f64,
    pub trend: Trend,
    pub retracement_382: f64,
    pub retracement_500: f64,
    pub retracement_618: f64,
    pub extension_1272: f64,
    pub extension_1618: f64,
}

impl FibLevels {
    /// Build levels from two anchors. The larger price always becomes `high`.
    pub fn from_anchors(a: f64, b: f64, trend: Trend) -> Self {
        let high = a.max(b);
        let low = a.min(b);
        let range = high - low;
        let retrace = |f: f64| high - f * range;
        let extend = |f: f64| match trend {
            Trend::Up => high + (f - 1.0) * range,
            Trend::Down => low - (f - 1.0) * range,
        };
        Self {
            high,
            low,
            trend,
            retracement_382: retrace(RETRACEMENT_RATIOS[0]),
            retracement_500: retrace(RETRACEMENT_RATIOS[1]),
            retracement_618: retrace(RETRACEMENT_RATIOS[2]),
            extension_1272: extend(EXTENSION_RATIOS[0]),
            extension_1618: extend(EXTENSION_RATIOS[1]),
        }
    }

    /// (ratio, price) pairs for the retracement levels, shallowest first.
    pub fn retracements(&self) -> [(f64, f64); 3] {
        [
            (RETRACEMENT_RATIOS[0], self.retracement_382),
            (RETRACEMENT_RATIOS[1], self.retracement_500),
            (RETRACEMENT_RATIOS[2], self.retracement_618),
        ]
    }

    /// (ratio, price) pairs for the extension levels, nearest first.
    pub fn extensions(&self) -> [(f64, f64); 2] {
        [
            (EXTENSION_RATIOS[0], self.extension_1272),
            (EXTENSION_RATIOS[1], self.extension_1618),
        ]
    }
}

/// Fibonacci levels, or the reason there are none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FibSetup {
    Ready(FibLevels),
    /// No swing high or no swing low in the series.
    Insufficient,
}

impl FibSetup {
    pub fn levels(&self) -> Option<&FibLevels> {
        match self {
            FibSetup::Ready(levels) => Some(levels),
            FibSetup::Insufficient => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FibSetup::Ready(_))
    }
}

/// Derive levels from the most recent swing high and most recent swing low.
///
/// The two are picked independently by timestamp, so `swings` need not be
/// sorted. Trend is `Up` when the high is the later of the two.
pub fn derive_fibonacci(swings: &[SwingPoint]) -> FibSetup {
    let latest = |kind: SwingKind| {
        swings
            .iter()
            .filter(|s| s.kind == kind)
            .max_by_key(|s| s.timestamp)
    };
    let (Some(high), Some(low)) = (latest(SwingKind::High), latest(SwingKind::Low)) else {
        return FibSetup::Insufficient;
    };

    let trend = if high.timestamp > low.timestamp {
        Trend::Up
    } else {
        Trend::Down
    };
    FibSetup::Ready(FibLevels::from_anchors(high.price, low.price, trend))
}

/// Detect swings over `candles` and derive levels from them.
pub fn fibonacci_for(candles: &[Candle]) -> FibSetup {
    derive_fibonacci(&swing_points(candles))
}
