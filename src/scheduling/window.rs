use chrono::{DateTime, Duration, TimeZone, Timelike};
use rand::Rng;

use crate::models::NotificationWindow;

/// How far ahead `next_allowed_instant` looks before giving up.
pub const MAX_SCAN_HOURS: i64 = 48;

const SCAN_EXHAUSTED_FALLBACK_SECS: i64 = 60 * 60;
const ARITHMETIC_FALLBACK_SECS: i64 = 60;

pub fn is_hour_allowed(hour: u32, window: &NotificationWindow) -> bool {
    let (start, end) = (window.start_hour(), window.end_hour());
    if start == end {
        return true;
    }
    if start < end {
        return hour >= start && hour < end;
    }
    hour >= start || hour < end
}

/// Picks a uniformly random second inside the hour beginning at `hour_start`.
pub fn random_instant_within_hour<Tz: TimeZone>(hour_start: &DateTime<Tz>) -> DateTime<Tz> {
    let mut rng = rand::thread_rng();
    let minute: i64 = rng.gen_range(0..60);
    let second: i64 = rng.gen_range(0..60);
    hour_start.clone() + Duration::minutes(minute) + Duration::seconds(second)
}

/// Returns the first randomized instant strictly after `now` that falls in an
/// allowed hour, scanning at most `MAX_SCAN_HOURS` hours ahead.
pub fn next_allowed_instant<Tz: TimeZone>(
    now: &DateTime<Tz>,
    window: &NotificationWindow,
) -> DateTime<Tz> {
    let Some(start_of_hour) = truncate_to_hour(now) else {
        return now.clone() + Duration::seconds(ARITHMETIC_FALLBACK_SECS);
    };

    for offset in 0..=MAX_SCAN_HOURS {
        let Some(hour_start) = start_of_hour
            .clone()
            .checked_add_signed(Duration::hours(offset))
        else {
            return now.clone() + Duration::seconds(ARITHMETIC_FALLBACK_SECS);
        };
        if !is_hour_allowed(hour_start.hour(), window) {
            continue;
        }
        let target = random_instant_within_hour(&hour_start);
        if target > *now {
            return target;
        }
    }

    now.clone() + Duration::seconds(SCAN_EXHAUSTED_FALLBACK_SECS)
}

/// Steps back to the start of the local hour on the absolute timeline, so an
/// instant inside a DST fold keeps its own offset instead of becoming ambiguous.
fn truncate_to_hour<Tz: TimeZone>(instant: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let into_hour = Duration::minutes(i64::from(instant.minute()))
        + Duration::seconds(i64::from(instant.second()))
        + Duration::nanoseconds(i64::from(instant.nanosecond()));
    instant.clone().checked_sub_signed(into_hour)
}
