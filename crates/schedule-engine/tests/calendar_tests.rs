//! Tests for calendar arithmetic helpers.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use schedule_engine::calendar::{
    add_years, days_in_month, format_date, local_day_bounds, local_to_utc, parse_date,
    resolve_month_day, saturating_add, saturating_sub, to_local, truncate_to_minute,
};
use schedule_engine::ScheduleError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ---------------------------------------------------------------------------
// YYYYMMDD parsing
// ---------------------------------------------------------------------------

#[test]
fn parses_eight_digit_dates() {
    assert_eq!(parse_date("20240229").unwrap(), date(2024, 2, 29));
    assert_eq!(parse_date("16890220").unwrap(), date(1689, 2, 20));
}

#[test]
fn rejects_malformed_dates() {
    let malformed = [
        "", "2024011", "202401011", "2024-01-01", "+2024011", "ooops", "20230229", "20241301",
        "15000156",
    ];
    for bad in malformed {
        assert_eq!(
            parse_date(bad),
            Err(ScheduleError::InvalidDate(bad.to_string())),
            "{bad:?} should be rejected"
        );
    }
}

#[test]
fn formats_with_zero_padding() {
    assert_eq!(format_date(date(2024, 3, 5)), "20240305");
    assert_eq!(format_date(parse_date("09990101").unwrap()), "09990101");
}

// ---------------------------------------------------------------------------
// Month lengths and month-end selectors
// ---------------------------------------------------------------------------

#[test]
fn month_lengths_follow_leap_years() {
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2023, 2), 28);
    assert_eq!(days_in_month(1900, 2), 28);
    assert_eq!(days_in_month(2000, 2), 29);
    assert_eq!(days_in_month(2024, 4), 30);
    assert_eq!(days_in_month(2024, 12), 31);
}

#[test]
fn negative_selectors_count_from_month_end() {
    assert_eq!(resolve_month_day(2024, 2, -1), Some(29));
    assert_eq!(resolve_month_day(2023, 2, -1), Some(28));
    assert_eq!(resolve_month_day(2023, 2, -2), Some(27));
    assert_eq!(resolve_month_day(2024, 1, -2), Some(30));
}

#[test]
fn positive_selectors_only_exist_in_long_enough_months() {
    assert_eq!(resolve_month_day(2024, 4, 30), Some(30));
    assert_eq!(resolve_month_day(2024, 4, 31), None);
    assert_eq!(resolve_month_day(2023, 2, 29), None);
}

// ---------------------------------------------------------------------------
// Year stepping
// ---------------------------------------------------------------------------

#[test]
fn leap_day_rolls_to_march_first() {
    assert_eq!(add_years(date(2024, 2, 29), 1), Some(date(2025, 3, 1)));
    assert_eq!(add_years(date(2024, 2, 29), 4), Some(date(2028, 2, 29)));
    assert_eq!(add_years(date(2023, 6, 15), 1), Some(date(2024, 6, 15)));
}

// ---------------------------------------------------------------------------
// Instants
// ---------------------------------------------------------------------------

#[test]
fn truncation_drops_seconds_and_fractions() {
    let precise = Utc.with_ymd_and_hms(2024, 3, 15, 10, 15, 42).unwrap()
        + chrono::Duration::milliseconds(500);
    assert_eq!(
        truncate_to_minute(precise),
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 15, 0).unwrap()
    );
}

#[test]
fn day_bounds_follow_the_zone() {
    let (start, end) = local_day_bounds(date(2024, 3, 15), Tz::Europe__Moscow);
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 14, 21, 0, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 15, 21, 0, 0).unwrap());
}

#[test]
fn last_day_ends_at_the_end_of_time() {
    let (start, end) = local_day_bounds(NaiveDate::MAX, Tz::UTC);
    assert_eq!(start, NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap().and_utc());
    assert_eq!(end, DateTime::<Utc>::MAX_UTC);
}

#[test]
fn local_view_past_the_last_date_is_none() {
    let end = DateTime::<Utc>::MAX_UTC;
    assert_eq!(to_local(end, Tz::UTC), Some(end.naive_utc()));
    assert_eq!(to_local(end, Tz::Europe__Moscow), None);
    assert_eq!(to_local(DateTime::<Utc>::MIN_UTC, Tz::America__New_York), None);

    let noon = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    assert_eq!(
        to_local(noon, Tz::Europe__Moscow),
        Some(date(2024, 3, 15).and_hms_opt(15, 0, 0).unwrap())
    );
}

#[test]
fn saturating_arithmetic_clamps_to_the_range() {
    let hour = Duration::hours(1);
    assert_eq!(saturating_add(DateTime::<Utc>::MAX_UTC, hour), DateTime::<Utc>::MAX_UTC);
    assert_eq!(saturating_sub(DateTime::<Utc>::MIN_UTC, hour), DateTime::<Utc>::MIN_UTC);

    let noon = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    assert_eq!(saturating_add(noon, hour), noon + hour);
    assert_eq!(saturating_sub(noon, hour), noon - hour);
}

#[test]
fn dst_gap_has_no_instant() {
    let in_gap = date(2024, 3, 10).and_hms_opt(2, 30, 0).unwrap();
    assert_eq!(local_to_utc(Tz::America__New_York, in_gap), None);
}

#[test]
fn ambiguous_time_resolves_to_earlier_instant() {
    // 01:30 happens twice on 2024-11-03 in New York; the first is EDT (UTC-4).
    let ambiguous = date(2024, 11, 3).and_hms_opt(1, 30, 0).unwrap();
    assert_eq!(
        local_to_utc(Tz::America__New_York, ambiguous),
        Some(Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap())
    );
}
