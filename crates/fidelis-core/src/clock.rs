//! Deterministic hour-of-day and weekday derivation.
//!
//! These functions use the exact integer arithmetic the proof circuit uses
//! (`(ts / 3600) % 24` and `(ts / 86400 + 4) % 7`, with the +4 anchoring
//! 1970-01-01 to Thursday), rather than a calendar library, so the manual
//! evaluator and the circuit can never disagree on time derivation.
//! Weekdays are numbered 0 = Sunday … 6 = Saturday.
//!
//! The timezone offset (minutes east of UTC) is applied by shifting the
//! timestamp before derivation, identically on both paths.

/// Shift a Unix timestamp into the configured reference zone.
pub fn local_timestamp(timestamp: i64, offset_minutes: i32) -> i64 {
    timestamp + i64::from(offset_minutes) * 60
}

/// Hour of day (0–23) in the reference zone.
pub fn hour_of_day(timestamp: i64, offset_minutes: i32) -> u8 {
    let local = local_timestamp(timestamp, offset_minutes);
    local.div_euclid(3600).rem_euclid(24) as u8
}

/// Weekday (0 = Sunday … 6 = Saturday) in the reference zone.
pub fn weekday(timestamp: i64, offset_minutes: i32) -> u8 {
    let local = local_timestamp(timestamp, offset_minutes);
    (local.div_euclid(86400) + 4).rem_euclid(7) as u8
}
