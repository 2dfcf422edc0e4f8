//! Timestamp-gated validity.
//!
//! A value is live only while its timestamp is within a fixed window of now.
//! Presence uses an inclusive bound, the RFID relay an exclusive one.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

/// Maximum heartbeat age for a device to count as online (inclusive).
pub const STALE_WINDOW: StdDuration = StdDuration::from_secs(60);

/// Maximum scan age for the live RFID value to count as active (exclusive).
pub const ACTIVE_WINDOW: StdDuration = StdDuration::from_secs(30);

pub fn to_chrono(window: StdDuration) -> Duration {
    Duration::milliseconds(window.as_millis().min(i64::MAX as u128) as i64)
}

/// `now - at <= window`. Timestamps ahead of `now` count as fresh.
pub fn within_inclusive(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(at) <= window
}

/// `now - at < window`. Timestamps ahead of `now` count as fresh.
pub fn within_exclusive(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(at) < window
}
