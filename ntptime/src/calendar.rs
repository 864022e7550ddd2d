//! UNIX time to calendar date conversion
use core::fmt::{Display, Formatter};

const SECS_IN_MINUTE: u64 = 60;
const MINUTES_IN_HOUR: u64 = 60;
const HOURS_IN_DAY: u64 = 24;
const SECS_IN_DAY: u64 = SECS_IN_MINUTE * MINUTES_IN_HOUR * HOURS_IN_DAY;
const UNIX_EPOCH_YEAR: u16 = 1970;
/// 1970-01-01 was a Thursday
const EPOCH_WEEKDAY_SHIFT: u64 = 4;

/// Days in each month for a non-leap year
const MONTH_DAYS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Day of week encoding used by [`CalendarTime::day_of_week`]
pub mod weekday {
    pub const SUNDAY: u8 = 1;
    pub const MONDAY: u8 = 2;
    pub const TUESDAY: u8 = 3;
    pub const WEDNESDAY: u8 = 4;
    pub const THURSDAY: u8 = 5;
    pub const FRIDAY: u8 = 6;
    pub const SATURDAY: u8 = 7;
}

/// Broken-down calendar representation of a UNIX timestamp
///
/// Produced by [`to_calendar`]. An instance with `valid == false` carries
/// no meaningful date fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CalendarTime {
    /// Absolute year, e.g. `2023`
    pub year: u16,
    /// Month, `1..=12`
    pub month: u8,
    /// Day of month, `1..=31`
    pub day: u8,
    /// Day of week, `1` is Sunday and `7` is Saturday (see [`weekday`])
    pub day_of_week: u8,
    /// Hour, `0..=23`
    pub hour: u8,
    /// Minute, `0..=59`
    pub minute: u8,
    /// Second, `0..=59`
    pub second: u8,
    /// Seconds since UNIX epoch the fields were derived from
    pub epoch: u32,
    /// Whether the fields hold a converted time
    pub valid: bool,
}

impl CalendarTime {
    /// An instance marking the absence of a time
    #[must_use]
    pub fn invalid() -> Self {
        CalendarTime::default()
    }

    /// Rebuild seconds since UNIX epoch from the calendar fields
    ///
    /// The inverse of [`to_calendar`]; `epoch` and `day_of_week` are not consulted.
    #[must_use]
    pub fn to_unix(&self) -> u64 {
        let years_days: u64 = (UNIX_EPOCH_YEAR..self.year)
            .map(|year| u64::from(days_in_year(year)))
            .sum();
        let months_days: u64 = (1..self.month)
            .map(|month| u64::from(days_in_month(self.year, month)))
            .sum();
        let days = (years_days + months_days + u64::from(self.day)).saturating_sub(1);

        days * SECS_IN_DAY
            + u64::from(self.hour) * MINUTES_IN_HOUR * SECS_IN_MINUTE
            + u64::from(self.minute) * SECS_IN_MINUTE
            + u64::from(self.second)
    }
}

impl Display for CalendarTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Proleptic Gregorian leap year rule
#[must_use]
pub fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_year(year: u16) -> u16 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Number of days in `month` (`1..=12`) of `year`
#[must_use]
pub fn days_in_month(year: u16, month: u8) -> u8 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        MONTH_DAYS[usize::from(month.clamp(1, 12) - 1)]
    }
}

/// Convert seconds since UNIX epoch into calendar fields
///
/// The result is always marked valid. A 32-bit input keeps every result
/// within year 2106.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn to_calendar(timestamp: u32) -> CalendarTime {
    let mut time = u64::from(timestamp);
    let second = (time % SECS_IN_MINUTE) as u8;
    time /= SECS_IN_MINUTE;
    let minute = (time % MINUTES_IN_HOUR) as u8;
    time /= MINUTES_IN_HOUR;
    let hour = (time % HOURS_IN_DAY) as u8;
    // now it is days since epoch
    let mut days = time / HOURS_IN_DAY;
    let day_of_week = ((days + EPOCH_WEEKDAY_SHIFT) % 7) as u8 + 1;

    let mut year = UNIX_EPOCH_YEAR;
    while days >= u64::from(days_in_year(year)) {
        days -= u64::from(days_in_year(year));
        year += 1;
    }

    // days in this year, starting at 0
    let mut month = 1u8;
    while month < 12 && days >= u64::from(days_in_month(year, month)) {
        days -= u64::from(days_in_month(year, month));
        month += 1;
    }

    CalendarTime {
        year,
        month,
        day: days as u8 + 1,
        day_of_week,
        hour,
        minute,
        second,
        epoch: timestamp,
        valid: true,
    }
}

#[cfg(test)]
mod calendar_tests {
    use super::*;
    use chrono::{DateTime, Datelike, Timelike};
    use proptest::prelude::*;

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(1972));
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1970));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2100));
        assert!(!is_leap_year(1900));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(29, days_in_month(2024, 2));
        assert_eq!(28, days_in_month(2023, 2));
        assert_eq!(28, days_in_month(2100, 2));
        assert_eq!(31, days_in_month(2023, 12));
        assert_eq!(30, days_in_month(2023, 11));
    }

    #[test]
    fn test_epoch_start() {
        let time = to_calendar(0);

        assert_eq!(1970, time.year);
        assert_eq!(1, time.month);
        assert_eq!(1, time.day);
        assert_eq!(weekday::THURSDAY, time.day_of_week);
        assert_eq!(5, time.day_of_week);
        assert_eq!((0, 0, 0), (time.hour, time.minute, time.second));
        assert!(time.valid);
    }

    #[test]
    fn test_known_dates() {
        let time = to_calendar(1_619_177_764);
        assert_eq!((2021, 4, 23), (time.year, time.month, time.day));
        assert_eq!(weekday::FRIDAY, time.day_of_week);
        assert_eq!((11, 36, 4), (time.hour, time.minute, time.second));
        assert_eq!(1_619_177_764, time.epoch);

        // leap day
        let time = to_calendar(951_782_400);
        assert_eq!((2000, 2, 29), (time.year, time.month, time.day));
        assert_eq!(weekday::TUESDAY, time.day_of_week);

        // last second of a year
        let time = to_calendar(1_704_067_199);
        assert_eq!((2023, 12, 31), (time.year, time.month, time.day));
        assert_eq!((23, 59, 59), (time.hour, time.minute, time.second));
        assert_eq!(weekday::SUNDAY, time.day_of_week);

        let time = to_calendar(1_735_603_200);
        assert_eq!((2024, 12, 31), (time.year, time.month, time.day));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", to_calendar(1_619_177_764)),
            "2021-04-23 11:36:04"
        );
        assert_eq!(format!("{}", to_calendar(0)), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_invalid() {
        let time = CalendarTime::invalid();

        assert!(!time.valid);
    }

    proptest! {
        #[test]
        fn calendar_roundtrip(timestamp in any::<u32>()) {
            prop_assert_eq!(u64::from(timestamp), to_calendar(timestamp).to_unix());
        }

        #[test]
        fn calendar_matches_chrono(timestamp in any::<u32>()) {
            let time = to_calendar(timestamp);
            let reference = DateTime::from_timestamp(i64::from(timestamp), 0).unwrap();

            prop_assert_eq!(i32::from(time.year), reference.year());
            prop_assert_eq!(u32::from(time.month), reference.month());
            prop_assert_eq!(u32::from(time.day), reference.day());
            prop_assert_eq!(u32::from(time.hour), reference.hour());
            prop_assert_eq!(u32::from(time.minute), reference.minute());
            prop_assert_eq!(u32::from(time.second), reference.second());
            prop_assert_eq!(
                u32::from(time.day_of_week),
                reference.weekday().num_days_from_sunday() + 1
            );
        }
    }
}
