//! Property tests for decision-core invariants.
//!
//! Uses proptest to verify:
//! 1. Fibonacci ordering: high >= low, retracements strictly descend above low
//! 2. Swing labels: never on the edges, always a strict 5-candle extremum
//! 3. Score bounds: every score lands in [0, 10] and repeats exactly
//! 4. Risk gate: an accepted signal never has a ratio below the minimum
//! 5. Zero risk is always rejected; breakouts only on strict inequality

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use proptest::prelude::*;

use confluence_core::analysis::{ByRole, Snapshot};
use confluence_core::domain::{Bias, Candle, Direction, IndicatorFields, TimeSeries};
use confluence_core::risk::{place_levels, Rejection, RiskValidator};
use confluence_core::scoring::{CandidateSignal, ConfluenceScorer, RubricLabels};
use confluence_core::swing::{detect_swings, FibLevels, FibSetup, Trend};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..1000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_trend() -> impl Strategy<Value = Trend> {
    prop_oneof![Just(Trend::Up), Just(Trend::Down)]
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

fn arb_bias() -> impl Strategy<Value = Bias> {
    prop_oneof![Just(Bias::Bullish), Just(Bias::Bearish), Just(Bias::Neutral)]
}

/// A sane bar with arbitrary indicator values.
fn arb_candle() -> impl Strategy<Value = Candle> {
    (
        arb_price(),
        arb_price(),
        0.0..20.0_f64,
        0.0..20.0_f64,
        proptest::array::uniform10(-200.0..200.0_f64),
    )
        .prop_map(|(open, close, up, down, ind)| {
            let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let high = open.max(close) + up;
            let low = open.min(close) - down;
            let mut c = Candle::new(t, open, high, low, close, 1.0);
            c.indicators = IndicatorFields {
                ema_fast: ind[0],
                ema_slow: ind[1],
                ema_trend_short: ind[2],
                ema_trend_long: ind[3],
                smma: ind[4],
                macd: ind[5],
                macd_signal: ind[6],
                stoch_k: ind[7],
                stoch_d: ind[8],
                atr: ind[9].abs(),
            };
            c
        })
}

fn series_ending_with(last: Candle, before: Vec<Candle>) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let candles = before
        .into_iter()
        .chain(std::iter::once(last))
        .enumerate()
        .map(|(i, mut c)| {
            c.timestamp = base + Duration::minutes(15 * i as i64);
            c
        })
        .collect();
    TimeSeries::new(candles).unwrap()
}

fn candidate(direction: Direction, entry: f64, fib: FibLevels) -> CandidateSignal {
    CandidateSignal {
        symbol: "BTC/USDT".into(),
        direction,
        entry_price: entry,
        score: 10.0,
        confluence: Vec::new(),
        fib: FibSetup::Ready(fib),
        generated_at: FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap(),
    }
}

// ── 1. Fibonacci ordering ────────────────────────────────────────────

proptest! {
    #[test]
    fn fib_levels_are_ordered(a in arb_price(), b in arb_price(), trend in arb_trend()) {
        let fib = FibLevels::from_anchors(a, b, trend);
        prop_assert!(fib.high >= fib.low);
        if fib.high > fib.low {
            prop_assert!(fib.retracement_382 > fib.retracement_500);
            prop_assert!(fib.retracement_500 > fib.retracement_618);
            prop_assert!(fib.retracement_618 > fib.low);
            match trend {
                Trend::Up => prop_assert!(fib.extension_1618 > fib.extension_1272 && fib.extension_1272 > fib.high),
                Trend::Down => prop_assert!(fib.extension_1618 < fib.extension_1272 && fib.extension_1272 < fib.low),
            }
        }
    }
}

// ── 2. Swing labels ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn swings_are_strict_interior_extrema(candles in prop::collection::vec(arb_candle(), 0..40)) {
        let labels = detect_swings(&candles);
        prop_assert_eq!(labels.len(), candles.len());
        let n = candles.len();
        for (i, label) in labels.iter().enumerate() {
            if i < 2 || i + 2 >= n {
                prop_assert!(!label.is_swing());
                continue;
            }
            prop_assert!(!(label.high.is_some() && label.low.is_some()));
            let others = [i - 2, i - 1, i + 1, i + 2];
            if let Some(h) = label.high {
                prop_assert_eq!(h, candles[i].high);
                prop_assert!(others.iter().all(|&j| h > candles[j].high));
            }
            if let Some(l) = label.low {
                prop_assert!(others.iter().all(|&j| l < candles[j].low));
            }
        }
    }
}

// ── 3. Score bounds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_bounded_and_repeatable(
        bias in arb_bias(),
        latest in prop::collection::vec(arb_candle(), 4),
        before in prop::collection::vec(arb_candle(), 2),
        price in arb_price(),
    ) {
        let series = ByRole {
            bias: series_ending_with(latest[0].clone(), Vec::new()),
            confirmation: series_ending_with(latest[1].clone(), Vec::new()),
            pattern: series_ending_with(latest[2].clone(), Vec::new()),
            entry: series_ending_with(latest[3].clone(), before),
        };
        let snap = Snapshot::new("X", bias, price, series, FibSetup::Insufficient).unwrap();
        let scorer = ConfluenceScorer::new(0.0, RubricLabels::default(), FixedOffset::east_opt(0).unwrap());

        match scorer.score(&snap) {
            None => prop_assert_eq!(bias, Bias::Neutral),
            Some(card) => {
                prop_assert!((2.0..=10.0).contains(&card.score));
                prop_assert!(!card.points.is_empty());
                prop_assert_eq!(scorer.score(&snap), Some(card));
            }
        }
    }
}

// ── 4–5. Risk gate ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn accepted_ratio_never_below_minimum(
        a in arb_price(),
        b in arb_price(),
        trend in arb_trend(),
        direction in arb_direction(),
        entry in arb_price(),
        atr in 0.0..50.0_f64,
        multiplier in 0.1..3.0_f64,
        min_rr in 0.0..5.0_f64,
    ) {
        let fib = FibLevels::from_anchors(a, b, trend);
        let validator = RiskValidator::new(min_rr, multiplier);
        match validator.validate(candidate(direction, entry, fib), atr) {
            Ok(signal) => {
                prop_assert!(signal.rr_ratio >= min_rr);
                prop_assert!((signal.candidate.entry_price - signal.stop_loss).abs() > 0.0);
            }
            Err(Rejection::RatioBelowMinimum { ratio, minimum }) => prop_assert!(ratio < minimum),
            Err(Rejection::ZeroRisk) => {}
            Err(Rejection::InsufficientFib) => prop_assert!(false, "fib was ready"),
        }
    }

    #[test]
    fn nan_atr_never_accepted(
        a in arb_price(),
        b in arb_price(),
        trend in arb_trend(),
        direction in arb_direction(),
        entry in arb_price(),
        min_rr in 0.0..5.0_f64,
    ) {
        let fib = FibLevels::from_anchors(a, b, trend);
        let validator = RiskValidator::new(min_rr, 1.5);
        prop_assert!(validator.calculate_sl_tp(candidate(direction, entry, fib), f64::NAN).is_none());
    }

    #[test]
    fn zero_risk_always_rejected(a in arb_price(), b in arb_price(), trend in arb_trend(), direction in arb_direction()) {
        let fib = FibLevels::from_anchors(a, b, trend);
        let entry = match direction {
            Direction::Long => fib.low,
            Direction::Short => fib.high,
        };
        let validator = RiskValidator::new(0.0, 1.5);
        prop_assert_eq!(
            validator.validate(candidate(direction, entry, fib), 0.0).unwrap_err(),
            Rejection::ZeroRisk
        );
        prop_assert!(validator.calculate_sl_tp(candidate(direction, entry, fib), 0.0).is_none());
    }

    #[test]
    fn breakout_only_past_the_anchor(a in arb_price(), b in arb_price(), trend in arb_trend(), atr in 0.0..10.0_f64) {
        let fib = FibLevels::from_anchors(a, b, trend);
        prop_assert!(!place_levels(Direction::Long, fib.high, &fib, atr, 1.5).breakout);
        prop_assert!(!place_levels(Direction::Short, fib.low, &fib, atr, 1.5).breakout);
        prop_assert!(place_levels(Direction::Long, fib.high + 0.01, &fib, atr, 1.5).breakout);
        prop_assert!(place_levels(Direction::Short, fib.low - 0.01, &fib, atr, 1.5).breakout);
    }
}
