//! Relative timestamps for feed cards and comment rows.

use chrono::{DateTime, Utc};

/// Format `then` relative to `now`.
///
/// Under a minute reads "Just now", then minutes, hours and days up to a
/// week; anything older falls back to the calendar date. Timestamps in the
/// future (clock skew between device and backend) read "Just now".
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let days = elapsed.num_days();
    if days < 7 {
        return format!("{days}d ago");
    }

    calendar_date(then)
}

/// Calendar date in the `M/D/YYYY` form.
#[must_use]
pub fn calendar_date(ts: DateTime<Utc>) -> String {
    ts.format("%-m/%-d/%Y").to_string()
}
