//! # Window Module
//!
//! Interprets ccusage blocks: picks the active window, classifies the burn
//! rate and works out how much of the window is left.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use tracing::debug;

use crate::models::Block;

pub const MODERATE_BURN_TPM: f64 = 300.0;
pub const HIGH_BURN_TPM: f64 = 700.0;

/// Return the first block flagged active, in the order ccusage listed them.
pub fn find_active_block(blocks: &[Block]) -> Option<&Block> {
    blocks.iter().find(|b| b.is_active)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnRateLevel {
    Low,
    Moderate,
    High,
}

impl BurnRateLevel {
    /// Bands are `[0, 300)`, `[300, 700)` and `[700, ∞)` tokens per minute.
    /// Anything below the moderate band, negative or NaN included, is low.
    pub fn classify(tokens_per_minute: f64) -> Self {
        if tokens_per_minute >= HIGH_BURN_TPM {
            BurnRateLevel::High
        } else if tokens_per_minute >= MODERATE_BURN_TPM {
            BurnRateLevel::Moderate
        } else {
            BurnRateLevel::Low
        }
    }

    /// Glyph-tagged label. The level names are not translated.
    pub fn label(self) -> &'static str {
        match self {
            BurnRateLevel::Low => "🟢 LOW",
            BurnRateLevel::Moderate => "🟡 MODERATE",
            BurnRateLevel::High => "🔴 HIGH",
        }
    }
}

/// What to do with a timestamp that fails to parse.
///
/// Unparseable timestamps become the Unix epoch instead of an error, so a
/// malformed block still renders (with meaningless times) rather than
/// blanking the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampParseDefault;

impl TimestampParseDefault {
    pub fn value() -> DateTime<FixedOffset> {
        DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
    }
}

/// Parse an RFC 3339 timestamp, keeping its encoded offset.
pub fn parse_timestamp(s: &str) -> DateTime<FixedOffset> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => ts,
        Err(err) => {
            debug!(value = s, error = %err, "unparseable timestamp, using epoch");
            TimestampParseDefault::value()
        }
    }
}

/// Format a remaining duration as `"{m}m"` or `"{h}h {m}m"`.
///
/// Negative durations (observed end past the nominal end) clamp to zero.
pub fn format_remaining(remaining: TimeDelta) -> String {
    let total_minutes = remaining.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Returns `(remaining, started)` for a block's time bounds.
///
/// `remaining` is `end - actual_end`; `started` is the start time as `HH:MM`
/// in the offset the timestamp was encoded with.
pub fn session_progress(start: &str, end: &str, actual_end: &str) -> (String, String) {
    let start = parse_timestamp(start);
    let end = parse_timestamp(end);
    let actual = parse_timestamp(actual_end);

    let remaining = format_remaining(end - actual);
    (remaining, start.format("%H:%M").to_string())
}
