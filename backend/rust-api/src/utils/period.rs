use chrono::{DateTime, Datelike, Utc};

/// True when `now` falls in a different calendar month (or year) than the
/// start of the usage period.
pub fn starts_new_period(period_started_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now.year(), now.month()) != (period_started_at.year(), period_started_at.month())
}
