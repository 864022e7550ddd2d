//! Timezone and daylight saving time adjustment
//!
//! Both rules are evaluated on the timestamp already shifted by the
//! timezone offset, and neither accounts for the hour the DST switch itself
//! moves the local clock.
use crate::calendar::{to_calendar, weekday};
use crate::types::DstRule;

const DST_SHIFT_SEC: u32 = 3600;

/// Hour the European rule switches at
const EU_SWITCH_HOUR: u32 = 1;
/// Hour the US rule switches at
const US_SWITCH_HOUR: u8 = 2;

/// Timezone offset in whole seconds, rounded to the nearest second
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn timezone_offset_seconds(hours: f32) -> i64 {
    let seconds = hours * 3600.0;

    if seconds >= 0.0 {
        (seconds + 0.5) as i64
    } else {
        (seconds - 0.5) as i64
    }
}

/// Shift a UTC timestamp by the timezone offset and, when `rule` says so
/// and the shifted time falls into summer time, by one more hour
///
/// Results are clamped to the `u32` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn adjust(timestamp: u32, timezone_hours: f32, rule: DstRule) -> u32 {
    let shifted = (i64::from(timestamp) + timezone_offset_seconds(timezone_hours))
        .clamp(0, i64::from(u32::MAX)) as u32;

    let summer = match rule {
        DstRule::None => false,
        DstRule::European => european_summer_time(shifted),
        DstRule::Us => us_daylight_time(shifted),
    };

    if summer {
        shifted.saturating_add(DST_SHIFT_SEC)
    } else {
        shifted
    }
}

/// Day of month of the last Sunday, closed form valid for years 1900..2100.
/// `k` is `4` for March and `1` for October.
fn last_sunday(year: u16, k: u32) -> u32 {
    31 - (5 * u32::from(year) / 4 + k) % 7
}

/// European summer time: from the last Sunday of March 01:00 until the last
/// Sunday of October 01:00
#[must_use]
pub fn european_summer_time(timestamp: u32) -> bool {
    let time = to_calendar(timestamp);
    let hours = u32::from(time.hour) + 24 * u32::from(time.day);

    match time.month {
        4..=9 => true,
        3 => hours >= EU_SWITCH_HOUR + 24 * last_sunday(time.year, 4),
        10 => hours < EU_SWITCH_HOUR + 24 * last_sunday(time.year, 1),
        _ => false,
    }
}

/// US daylight time: from the second Sunday of March 02:00 until the first
/// Sunday of November 02:00
#[must_use]
pub fn us_daylight_time(timestamp: u32) -> bool {
    let time = to_calendar(timestamp);
    let is_sunday = time.day_of_week == weekday::SUNDAY;
    // day of month of the most recent Sunday, today included
    let previous_sunday =
        i16::from(time.day) - (i16::from(time.day_of_week) - 1);

    match time.month {
        4..=10 => true,
        3 => {
            previous_sunday >= 8
                && (time.day > 14
                    || (is_sunday && time.hour >= US_SWITCH_HOUR)
                    || !is_sunday)
        }
        11 => {
            if previous_sunday < 1 {
                (is_sunday && time.hour < US_SWITCH_HOUR) || !is_sunday
            } else {
                time.day < 8 && is_sunday && time.hour < US_SWITCH_HOUR
            }
        }
        _ => false,
    }
}
