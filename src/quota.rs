//! Monthly quota arithmetic.
//!
//! Usage is recomputed from session rows on every check and never cached or
//! stored, so these functions stay pure: the handlers fetch the numbers, this
//! module turns them into a [`Quota`].

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// A user's position against their plan for the current calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub can_start: bool,
    pub minutes_remaining: i64,
    pub minutes_used: i64,
    pub monthly_limit: i64,
}

/// First instant of `now`'s calendar month, as a UTC instant for store
/// comparisons.
///
/// The month boundary is taken in `now`'s own timezone (the server's local
/// zone in production). Midnight can be skipped or repeated across a DST
/// transition; the earliest valid instant wins, falling back to the UTC
/// calendar if the zone has no valid reading at all.
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    now.timezone()
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| {
            Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                .single()
                .expect("first-of-month midnight is always valid in UTC")
        })
}

/// Seconds of usage converted to whole minutes, partial minutes counting as
/// full minutes.
pub fn minutes_used(total_seconds: i64) -> i64 {
    if total_seconds <= 0 {
        0
    } else {
        (total_seconds as u64).div_ceil(60) as i64
    }
}

/// Evaluate `used_seconds` of month-to-date usage against a plan's monthly
/// allowance.
pub fn evaluate(monthly_limit: i64, used_seconds: i64) -> Quota {
    let minutes_used = minutes_used(used_seconds);
    let minutes_remaining = (monthly_limit - minutes_used).max(0);
    Quota {
        can_start: minutes_remaining > 0,
        minutes_remaining,
        minutes_used,
        monthly_limit,
    }
}
