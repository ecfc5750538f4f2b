//! Tests for business hours configuration and the daily slot grid.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use schedule_engine::hours::HoursConfig;
use schedule_engine::{BusinessHours, ScheduleError};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, h, m, 0).unwrap()
}

fn day_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()
}

fn starts(hours: &BusinessHours, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    hours.slots_for_day(day(), now).map(|s| s.start).collect()
}

// ── Construction ────────────────────────────────────────────────────────────

#[test]
fn defaults_match_the_shop_schedule() {
    let hours = BusinessHours::default();
    assert_eq!(hours.open(), time(9, 0));
    assert_eq!(hours.close(), time(18, 0));
    assert_eq!(hours.slot_interval_minutes(), 30);
    assert_eq!(hours.min_lead_time(), Duration::minutes(30));
    assert_eq!(hours.timezone(), Tz::UTC);
}

#[test]
fn default_config_builds_the_default_hours() {
    let config = HoursConfig::default();
    assert_eq!(config.open, "09:00");
    assert_eq!(config.close, "18:00");
    assert_eq!(config.min_lead_minutes, None);
    assert_eq!(BusinessHours::try_from(config), Ok(BusinessHours::default()));
}

#[test]
fn lead_time_defaults_to_one_interval() {
    let hours = BusinessHours::new(time(8, 0), time(20, 0), 15).unwrap();
    assert_eq!(hours.min_lead_time(), Duration::minutes(15));
}

#[test]
fn rejects_unusable_hours() {
    assert!(matches!(
        BusinessHours::new(time(18, 0), time(9, 0), 30),
        Err(ScheduleError::InvalidConfig(_))
    ));
    assert!(matches!(
        BusinessHours::new(time(9, 0), time(9, 0), 30),
        Err(ScheduleError::InvalidConfig(_))
    ));
    assert!(matches!(
        BusinessHours::new(time(9, 0), time(18, 0), 0),
        Err(ScheduleError::InvalidConfig(_))
    ));
    assert!(matches!(
        BusinessHours::default().with_min_lead_time(Duration::minutes(-5)),
        Err(ScheduleError::InvalidConfig(_))
    ));
}

#[test]
fn deserializes_from_flat_config() {
    let hours: BusinessHours = serde_json::from_str(
        r#"{"open":"08:00","close":"20:00","slot_interval_minutes":15,"timezone":"Europe/Moscow"}"#,
    )
    .unwrap();
    assert_eq!(hours.open(), time(8, 0));
    assert_eq!(hours.close(), time(20, 0));
    assert_eq!(hours.min_lead_time(), Duration::minutes(15));
    assert_eq!(hours.timezone(), Tz::Europe__Moscow);

    let empty: BusinessHours = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, BusinessHours::default());
}

#[test]
fn config_errors_surface_during_deserialization() {
    assert!(serde_json::from_str::<BusinessHours>(r#"{"timezone":"Mars/Olympus"}"#).is_err());
    assert!(serde_json::from_str::<BusinessHours>(r#"{"open":"9am"}"#).is_err());
    assert!(serde_json::from_str::<BusinessHours>(r#"{"opening":"09:00"}"#).is_err());
    assert!(serde_json::from_str::<BusinessHours>(r#"{"min_lead_minutes":-1}"#).is_err());
}

#[test]
fn serializes_back_to_config_shape() {
    let value = serde_json::to_value(BusinessHours::default()).unwrap();
    assert_eq!(value["open"], "09:00");
    assert_eq!(value["close"], "18:00");
    assert_eq!(value["slot_interval_minutes"], 30);
    assert_eq!(value["min_lead_minutes"], 30);
    assert_eq!(value["timezone"], "UTC");
}

// ── Slot grid ───────────────────────────────────────────────────────────────

#[test]
fn full_day_has_eighteen_half_hour_slots() {
    let slots = starts(&BusinessHours::default(), day_before());
    assert_eq!(slots.len(), 18);
    assert_eq!(slots.first(), Some(&at(9, 0)));
    assert_eq!(slots.last(), Some(&at(17, 30)));
    assert!(slots.windows(2).all(|w| w[1] - w[0] == Duration::minutes(30)));
}

#[test]
fn lead_time_hides_near_slots() {
    // 10:10 + 30 min lead = 10:40, so the first slot is 11:00.
    let slots = starts(&BusinessHours::default(), at(10, 10));
    assert_eq!(slots.first(), Some(&at(11, 0)));
    assert_eq!(slots.len(), 14);
}

#[test]
fn slot_exactly_at_lead_time_is_offered() {
    let slots = starts(&BusinessHours::default(), at(10, 30));
    assert_eq!(slots.first(), Some(&at(11, 0)));
}

#[test]
fn past_day_has_no_slots() {
    let tomorrow = Utc.with_ymd_and_hms(2024, 3, 16, 8, 0, 0).unwrap();
    assert!(starts(&BusinessHours::default(), tomorrow).is_empty());
}

#[test]
fn grid_is_anchored_at_midnight() {
    let late_open = BusinessHours::new(time(9, 15), time(18, 0), 30).unwrap();
    assert_eq!(starts(&late_open, day_before()).first(), Some(&at(9, 30)));

    let odd_interval = BusinessHours::new(time(9, 0), time(18, 0), 45).unwrap();
    let slots = starts(&odd_interval, day_before());
    assert_eq!(slots.len(), 12);
    assert_eq!(slots[1], at(9, 45));
    assert_eq!(slots.last(), Some(&at(17, 15)));
}

#[test]
fn slots_are_computed_in_the_configured_zone() {
    let moscow = BusinessHours::default().with_timezone(Tz::Europe__Moscow);
    let slots = starts(&moscow, day_before());
    // 09:00 MSK is 06:00 UTC.
    assert_eq!(slots.first(), Some(&at(6, 0)));
    assert_eq!(slots.last(), Some(&at(14, 30)));
}

#[test]
fn dst_gap_slots_are_skipped() {
    let night = BusinessHours::new(time(1, 0), time(4, 0), 30)
        .unwrap()
        .with_timezone(Tz::America__New_York);
    let spring_forward = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    // 01:00, 01:30, then 02:00-02:59 does not exist, then 03:00, 03:30.
    assert_eq!(night.slots_for_day(spring_forward, now).count(), 4);
}

#[test]
fn iteration_is_repeatable() {
    let hours = BusinessHours::default();
    let slots = hours.slots_for_day(day(), at(12, 0));
    let first: Vec<_> = slots.clone().collect();
    let second: Vec<_> = slots.collect();
    assert_eq!(first, second);
    assert_eq!(first, hours.slots_for_day(day(), at(12, 0)).collect::<Vec<_>>());
}
