//! Timestamp conversions.
//!
//! Documents store instants as integer milliseconds since the Unix epoch so
//! the store can order them numerically.

use chrono::{DateTime, TimeZone, Utc};

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Returns `None` for values outside chrono's representable range.
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_trip_at_millisecond_precision() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(from_millis(to_millis(at)), Some(at));
    }

    #[test]
    fn out_of_range_is_none() {
        assert_eq!(from_millis(i64::MAX), None);
    }
}
