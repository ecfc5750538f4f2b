//! Calendar arithmetic shared by the recurrence engine and the slot policy.
//!
//! Dates travel as 8-digit `YYYYMMDD` strings at the edges and as
//! [`NaiveDate`] inside the engine. Instants are always `DateTime<Utc>`; local
//! wall-clock values are only derived when comparing against business hours.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};

/// Parse an 8-digit `YYYYMMDD` date.
///
/// Anything other than exactly eight ASCII digits forming a real calendar date
/// is rejected with [`ScheduleError::InvalidDate`].
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let invalid = || ScheduleError::InvalidDate(s.to_string());

    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = s[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = s[6..8].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Format a date as `YYYYMMDD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Number of days in the given month (28..=31).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Resolve a month-day selector to a concrete day of `year`/`month`.
///
/// Positive selectors are returned when that day exists in the month. `-1` is
/// the last day and `-2` the second-to-last day, recomputed per month.
pub fn resolve_month_day(year: i32, month: u32, selector: i32) -> Option<u32> {
    let last = days_in_month(year, month);
    match selector {
        -2 => Some(last - 1),
        -1 => Some(last),
        d if d >= 1 && (d as u32) <= last => Some(d as u32),
        _ => None,
    }
}

/// Add whole years to a date.
///
/// February 29 in a non-leap target year normalizes to March 1, the same
/// rollover a calendar performs for any out-of-range day.
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Minutes elapsed since local midnight.
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Wall-clock view of an instant in `zone`.
///
/// `None` when the local value falls outside the calendar, which only
/// happens within a day of [`DateTime::<Utc>::MAX_UTC`] or `MIN_UTC`.
pub fn to_local(instant: DateTime<Utc>, zone: Tz) -> Option<NaiveDateTime> {
    let utc = instant.naive_utc();
    utc.checked_add_offset(zone.offset_from_utc_datetime(&utc).fix())
}

/// Map a local wall-clock value in `zone` to an instant.
///
/// Returns `None` for wall-clock values inside a DST gap. Ambiguous values
/// (the repeated hour when clocks go back) resolve to the earlier instant.
pub fn local_to_utc(zone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The `[start, end)` instants covering local calendar day `day` in `zone`.
///
/// The last representable day ends at [`DateTime::<Utc>::MAX_UTC`].
pub fn local_day_bounds(day: NaiveDate, zone: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start(day, zone);
    let end = day
        .succ_opt()
        .map(|next| day_start(next, zone))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

/// `instant + span`, clamped to the representable range.
pub fn saturating_add(instant: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    instant.checked_add_signed(span).unwrap_or(if span < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// `instant - span`, clamped to the representable range.
pub fn saturating_sub(instant: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    instant.checked_sub_signed(span).unwrap_or(if span < Duration::zero() {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

fn day_start(day: NaiveDate, zone: Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    // A handful of zones skip midnight itself on DST day; the day then starts
    // at the first wall-clock value that exists.
    local_to_utc(zone, midnight)
        .or_else(|| local_to_utc(zone, midnight + Duration::hours(1)))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Serde adapter for dates stored as `YYYYMMDD` strings.
pub mod yyyymmdd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}
