//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDateTime, Utc};

/// UTC timestamp used for `last_seen`, audit creation times, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current wall-clock time in the host's local zone, as seen by
/// the schedule evaluator.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Key identifying the calendar minute of `at`, used to suppress duplicate
/// schedule firings within the same matching minute.
#[must_use]
pub fn minute_key(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
