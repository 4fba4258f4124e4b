//! Display formatting for counters and timestamps

use chrono::{DateTime, Utc};

/// Social-style counter: `999`, `1.2k`, `10k`
pub fn compact_count(count: u64) -> String {
    if count >= 10_000 {
        format!("{}k", count / 1000)
    } else if count >= 1000 {
        format!("{:.1}k", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// Age of a timestamp relative to `now`
///
/// Anything older than a week, or in the future by more than a minute, is
/// shown as a date (`2025.10.16`).
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    match seconds {
        s if s < -60 => at.format("%Y.%m.%d").to_string(),
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => plural(s / 60, "minute"),
        s if s < 86_400 => plural(s / 3600, "hour"),
        s if s < 604_800 => plural(s / 86_400, "day"),
        _ => at.format("%Y.%m.%d").to_string(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
