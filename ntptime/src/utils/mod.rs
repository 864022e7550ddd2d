//! Helpers to hand received time over to `chrono`
use chrono::{NaiveDate, NaiveDateTime};

use crate::CalendarTime;

/// Convert a calendar time into a `chrono` date-time. The result carries no
/// offset: it is whatever local time the client has been configured for.
///
/// Returns `None` for invalid results.
#[must_use]
pub fn to_naive_date_time(time: &CalendarTime) -> Option<NaiveDateTime> {
    if !time.valid {
        return None;
    }

    NaiveDate::from_ymd_opt(
        i32::from(time.year),
        u32::from(time.month),
        u32::from(time.day),
    )?
    .and_hms_opt(
        u32::from(time.hour),
        u32::from(time.minute),
        u32::from(time.second),
    )
}
