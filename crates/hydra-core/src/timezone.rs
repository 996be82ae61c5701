//! Fixed-offset helper for the Asia/Shanghai report cadence.
//!
//! Shanghai has observed a constant UTC+8 offset with no daylight-saving
//! transitions since 1991, so the scheduler hard-codes the offset instead of
//! carrying a full IANA tz database dependency.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};

pub const SHANGHAI_OFFSET_SECONDS: i32 = 8 * 3600;

pub fn shanghai_offset() -> FixedOffset {
    FixedOffset::east_opt(SHANGHAI_OFFSET_SECONDS).expect("valid fixed offset")
}

/// Converts a UTC instant to its Asia/Shanghai wall-clock representation.
pub fn to_shanghai(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&shanghai_offset())
}

/// The report wake times, expressed as Shanghai local time-of-day.
pub fn wake_times() -> [NaiveTime; 2] {
    [
        NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
        NaiveTime::from_hms_opt(20, 0, 0).expect("valid time"),
    ]
}

/// The next instant (strictly after `now`) at which the scheduler should
/// wake, expressed in UTC so callers can feed it straight to a timer.
pub fn next_wake(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_now = to_shanghai(now);
    let today = local_now.date_naive();

    let mut candidates: Vec<DateTime<FixedOffset>> = wake_times()
        .iter()
        .map(|t| {
            shanghai_offset()
                .from_local_datetime(&today.and_time(*t))
                .single()
                .expect("fixed offset never produces ambiguous/skipped times")
        })
        .collect();

    // Also consider tomorrow's first wake in case both of today's have passed.
    let tomorrow = today + Duration::days(1);
    candidates.push(
        shanghai_offset()
            .from_local_datetime(&tomorrow.and_time(wake_times()[0]))
            .single()
            .expect("fixed offset never produces ambiguous/skipped times"),
    );

    candidates
        .into_iter()
        .find(|c| *c > local_now)
        .expect("tomorrow's first wake is always strictly after now")
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_wake_before_first_slot_is_today_0800() {
        // 2026-01-05 00:00 UTC = 2026-01-05 08:00 Shanghai.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let wake = next_wake(now - Duration::hours(1));
        assert_eq!(wake, now);
    }

    #[test]
    fn next_wake_between_slots_is_today_2000() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 1, 0, 0).unwrap(); // 09:00 Shanghai
        let wake = next_wake(now);
        let expected = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(); // 20:00 Shanghai
        assert_eq!(wake, expected);
    }

    #[test]
    fn next_wake_after_last_slot_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 13, 0, 0).unwrap(); // 21:00 Shanghai
        let wake = next_wake(now);
        let expected = Utc.with_ymd_and_hms(2026, 1, 6, 0, 0, 0).unwrap(); // 2026-01-06 08:00 Shanghai
        assert_eq!(wake, expected);
    }
}
