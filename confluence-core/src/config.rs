//! Scanner configuration, loaded from TOML.
//!
//! Every section has defaults, so a file only needs the keys it changes.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::TimeframeRole;
use crate::indicators::IndicatorParams;

/// Highest score the rubric can produce.
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Minimum confluence score (0–10) for a candidate signal.
    pub min_confluence_score: f64,
    /// Minimum reward-to-risk ratio to TP1.
    pub min_rr_ratio: f64,
    /// Hours before the same symbol/direction may notify again.
    pub signal_cooldown_hours: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            min_confluence_score: 7.0,
            min_rr_ratio: 1.5,
            signal_cooldown_hours: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Stop distance beyond the swing anchor, in ATRs.
    pub atr_buffer_multiplier: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            atr_buffer_multiplier: 1.5,
        }
    }
}

/// Timeframe label per role, e.g. "8h". Used for data file names and
/// confluence labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeframeLabels {
    pub bias: String,
    pub confirmation: String,
    pub pattern: String,
    pub entry: String,
}

impl Default for TimeframeLabels {
    fn default() -> Self {
        Self {
            bias: "8h".into(),
            confirmation: "4h".into(),
            pattern: "1h".into(),
            entry: "15m".into(),
        }
    }
}

impl TimeframeLabels {
    pub fn get(&self, role: TimeframeRole) -> &str {
        match role {
            TimeframeRole::Bias => &self.bias,
            TimeframeRole::Confirmation => &self.confirmation,
            TimeframeRole::Pattern => &self.pattern,
            TimeframeRole::Entry => &self.entry,
        }
    }

    /// Label as shown in confluence points: "8h" → "8H", "15m" stays "15m".
    pub fn display(&self, role: TimeframeRole) -> String {
        let label = self.get(role);
        if label.ends_with('m') {
            label.to_string()
        } else {
            label.to_uppercase()
        }
    }

    /// "8H/4H/1H/15m"
    pub fn summary(&self) -> String {
        TimeframeRole::ALL
            .iter()
            .map(|&role| self.display(role))
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// UTC offset for signal timestamps, e.g. "+07:00".
    pub timezone: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timezone: "+07:00".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    pub run_interval_minutes: u64,
    pub default_symbol: String,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            run_interval_minutes: 15,
            default_symbol: "BTC/USDT".into(),
        }
    }
}

/// Full scanner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    pub indicators: IndicatorParams,
    pub timeframes: TimeframeLabels,
    pub notify: NotifyConfig,
    pub operation: OperationConfig,
}

impl ScannerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject values that would make the pipeline silently misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.strategy;
        if !(0.0..=MAX_SCORE).contains(&s.min_confluence_score) {
            return Err(invalid(
                "strategy.min_confluence_score",
                format!("{} is outside 0..=10", s.min_confluence_score),
            ));
        }
        if !s.min_rr_ratio.is_finite() || s.min_rr_ratio < 0.0 {
            return Err(invalid(
                "strategy.min_rr_ratio",
                format!("{} must be a non-negative number", s.min_rr_ratio),
            ));
        }
        let m = self.risk.atr_buffer_multiplier;
        if !m.is_finite() || m <= 0.0 {
            return Err(invalid(
                "risk.atr_buffer_multiplier",
                format!("{m} must be positive"),
            ));
        }

        let ind = &self.indicators;
        let lengths = [
            ("indicators.ema_fast", ind.ema_fast),
            ("indicators.ema_slow", ind.ema_slow),
            ("indicators.ema_trend_short", ind.ema_trend_short),
            ("indicators.ema_trend_long", ind.ema_trend_long),
            ("indicators.smma", ind.smma),
            ("indicators.atr", ind.atr),
            ("indicators.macd.fast", ind.macd.fast),
            ("indicators.macd.slow", ind.macd.slow),
            ("indicators.macd.signal", ind.macd.signal),
            ("indicators.stochastic.k", ind.stochastic.k),
            ("indicators.stochastic.d", ind.stochastic.d),
            ("indicators.stochastic.smooth_k", ind.stochastic.smooth_k),
        ];
        if let Some(&(field, _)) = lengths.iter().find(|(_, len)| *len == 0) {
            return Err(invalid(field, "length must be >= 1"));
        }
        if ind.ema_fast >= ind.ema_slow {
            return Err(invalid("indicators.ema_fast", "must be shorter than ema_slow"));
        }
        if ind.ema_trend_short >= ind.ema_trend_long {
            return Err(invalid(
                "indicators.ema_trend_short",
                "must be shorter than ema_trend_long",
            ));
        }
        if ind.macd.fast >= ind.macd.slow {
            return Err(invalid("indicators.macd.fast", "must be shorter than macd.slow"));
        }

        for role in TimeframeRole::ALL {
            if self.timeframes.get(role).trim().is_empty() {
                return Err(invalid("timeframes", format!("{role} label is empty")));
            }
        }
        if self.operation.run_interval_minutes == 0 {
            return Err(invalid("operation.run_interval_minutes", "must be >= 1"));
        }
        self.display_offset()?;
        Ok(())
    }

    /// Parse `notify.timezone` ("+07:00", "-05:30", "UTC", "Z").
    pub fn display_offset(&self) -> Result<FixedOffset, ConfigError> {
        let tz = &self.notify.timezone;
        parse_offset(tz)
            .ok_or_else(|| invalid("notify.timezone", format!("`{tz}` is not a UTC offset")))
    }

    /// Deterministic id for this configuration (blake3 of its JSON form).
    ///
    /// Logged at startup so signal logs can be tied to the exact settings.
    pub fn config_id(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("utc") || s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let unsigned = |t: &str| -> Option<u32> {
        if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        t.parse().ok()
    };
    let hours = unsigned(hours)?;
    let minutes = unsigned(minutes)?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    let seconds = (hours * 3600 + minutes * 60) as i32;
    FixedOffset::east_opt(sign * seconds)
}
