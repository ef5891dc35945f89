//! Timestamp encoding for the `ctime` / `mtime` columns.
//!
//! Timestamps are stored as RFC 3339 UTC text with a fixed microsecond
//! precision so that string order equals time order.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

/// Smallest representable step between two stored timestamps.
fn tick() -> Duration {
    Duration::microseconds(1)
}

/// Current time truncated to the stored precision.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Next modification time after `previous`: the current time, or one tick
/// past `previous` if the clock has not moved (or went backwards).
pub(crate) fn next_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + tick()
    }
}

pub(crate) fn encode(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encoding_is_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = a + tick();
        assert_eq!(encode(&a), "2024-01-01T00:00:00.000000Z");
        assert!(encode(&a) < encode(&b));
    }

    #[test]
    fn decode_reverses_encode() {
        let ts = now();
        assert_eq!(decode(&encode(&ts)).unwrap(), ts);
    }

    #[test]
    fn next_after_is_strictly_later() {
        let future = now() + Duration::seconds(60);
        assert_eq!(next_after(future), future + tick());
        let past = now() - Duration::seconds(60);
        assert!(next_after(past) > past);
    }
}
