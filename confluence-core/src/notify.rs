//! Signal delivery: message formatting and per-symbol cooldown.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::io::{self, Write};

use crate::config::{ScannerConfig, TimeframeLabels};
use crate::domain::Direction;
use crate::risk::PricedSignal;

/// Decimal places for a price: 2 above 100, 4 above 1, otherwise 6.
pub fn price_precision(price: f64) -> usize {
    if price > 100.0 {
        2
    } else if price > 1.0 {
        4
    } else {
        6
    }
}

/// Render an accepted signal as a Markdown message.
///
/// Every price uses the precision chosen for the entry price.
pub fn format_signal(signal: &PricedSignal, timeframes: &TimeframeLabels) -> String {
    let c = &signal.candidate;
    let p = price_precision(c.entry_price);
    let marker = match c.direction {
        Direction::Long => "🟢",
        Direction::Short => "🔴",
    };
    let points = c
        .confluence
        .iter()
        .map(|point| format!(" - {point}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📡 **Signal {dir}** {marker}\n\n\
         **Pair**: `{symbol}`\n\
         **TF**: `{tf}` | **Score**: `{score:.1}/10`\n\n\
         **Entry**: `{entry:.p$}`\n\
         **SL**: `{sl:.p$}`\n\
         **TP1**: `{tp1:.p$}`\n\
         **TP2**: `{tp2:.p$}`\n\n\
         **R:R (TP1)**: `1:{rr:.2}`\n\n\
         **Confluence**:\n{points}\n\n\
         **Timestamp (UTC{offset})**: `{ts}`",
        dir = c.direction,
        symbol = c.symbol,
        tf = timeframes.summary(),
        score = c.score,
        entry = c.entry_price,
        sl = signal.stop_loss,
        tp1 = signal.take_profit_1,
        tp2 = signal.take_profit_2,
        rr = signal.rr_ratio,
        offset = c.generated_at.offset(),
        ts = c.generated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Suppresses repeat notifications for the same symbol and direction.
#[derive(Debug, Clone, Default)]
pub struct Cooldown {
    hours: u32,
    last: HashMap<(String, Direction), DateTime<Utc>>,
}

impl Cooldown {
    pub fn new(hours: u32) -> Self {
        Self {
            hours,
            last: HashMap::new(),
        }
    }

    /// Active while `now` is before the last notification plus the window.
    pub fn is_active(&self, symbol: &str, direction: Direction, now: DateTime<Utc>) -> bool {
        self.last
            .get(&(symbol.to_string(), direction))
            .is_some_and(|&last| now < last + Duration::hours(i64::from(self.hours)))
    }

    pub fn record(&mut self, symbol: &str, direction: Direction, now: DateTime<Utc>) {
        self.last.insert((symbol.to_string(), direction), now);
        tracing::info!(symbol, %direction, hours = self.hours, "cooldown started");
    }
}

/// Output format for delivered signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Markdown,
    /// One JSON object per line.
    Json,
}

/// Writes accepted signals to a sink, honouring the cooldown.
#[derive(Debug)]
pub struct Notifier<W: Write> {
    sink: W,
    cooldown: Cooldown,
    timeframes: TimeframeLabels,
    format: Format,
}

impl<W: Write> Notifier<W> {
    pub fn new(sink: W, cooldown: Cooldown, timeframes: TimeframeLabels, format: Format) -> Self {
        Self {
            sink,
            cooldown,
            timeframes,
            format,
        }
    }

    pub fn from_config(sink: W, config: &ScannerConfig, format: Format) -> Self {
        Self::new(
            sink,
            Cooldown::new(config.strategy.signal_cooldown_hours),
            config.timeframes.clone(),
            format,
        )
    }

    /// Deliver `signal` unless its symbol/direction is cooling down.
    ///
    /// Returns whether the signal was written.
    pub fn notify(&mut self, signal: &PricedSignal, now: DateTime<Utc>) -> io::Result<bool> {
        let c = &signal.candidate;
        if self.cooldown.is_active(&c.symbol, c.direction, now) {
            tracing::info!(symbol = %c.symbol, "signal on cooldown, skipping notification");
            return Ok(false);
        }

        match self.format {
            Format::Markdown => {
                writeln!(self.sink, "{}\n", format_signal(signal, &self.timeframes))?;
            }
            Format::Json => {
                serde_json::to_writer(&mut self.sink, signal)?;
                writeln!(self.sink)?;
            }
        }
        self.sink.flush()?;
        self.cooldown.record(&c.symbol, c.direction, now);
        Ok(true)
    }

    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    pub fn into_sink(self) -> W {
        self.sink
    }
}
