//! Text formatting shared by the commands.

use chrono::{DateTime, Local, Utc};

/// `m:ss`, minutes unbounded.
pub fn clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// `Xh Ym`, as on the dashboard.
pub fn hours_minutes(secs: u64) -> String {
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// Whole minutes, floored.
pub fn minutes(secs: u64) -> String {
    format!("{}m", secs / 60)
}

/// Short local date and 24h time, e.g. `Mar 01 09:30`.
pub fn log_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%b %d %H:%M").to_string()
}

pub fn roman(n: u32) -> String {
    const NUMERALS: [&str; 6] = ["I", "II", "III", "IV", "V", "VI"];
    n.checked_sub(1)
        .and_then(|i| NUMERALS.get(i as usize))
        .map(|s| s.to_string())
        .unwrap_or_else(|| n.to_string())
}

pub fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}
