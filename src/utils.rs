/// Default polling period, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Round to `decimals` places, ties away from zero.
///
/// `format!("{:.1}")` rounds exact binary ties to even, so values are
/// pre-rounded with `f64::round` before formatting.
pub fn round_half_away(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

pub fn format_currency(v: f64) -> String {
    format!("{:.2}", round_half_away(v, 2))
}

pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", round_half_away(n as f64 / 1e6, 1))
    } else if n >= 1_000 {
        format!("{:.1}k", round_half_away(n as f64 / 1e3, 1))
    } else {
        n.to_string()
    }
}

pub fn format_rate(tokens_per_minute: f64) -> String {
    format!("{:.0}", tokens_per_minute.round())
}
