use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Format used for dates everywhere on disk: score cache keys and activity log days.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of activity log timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(moment: NaiveDateTime) -> String {
    moment.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

/// Returns `days` consecutive dates ending with `last` (inclusive), oldest first.
pub fn days_ending_at(last: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64)
        .rev()
        .map(|offset| last - Duration::days(offset))
        .collect()
}

/// Renders whole seconds as `1h2m3s`, `2m3s` or `3s`.
pub fn format_seconds(seconds: f64) -> String {
    let v = Duration::seconds(seconds.max(0.) as i64);
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
