//! Tests for the repetition rule grammar.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use schedule_engine::{RepetitionRule, ScheduleError};

fn set<T: Ord + Copy>(values: &[T]) -> BTreeSet<T> {
    values.iter().copied().collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn is_invalid_rule(result: Result<RepetitionRule, ScheduleError>) -> bool {
    matches!(result, Err(ScheduleError::InvalidRule(_)))
}

// ── Accepted rules ──────────────────────────────────────────────────────────

#[test]
fn parses_every_variant() {
    assert_eq!(RepetitionRule::parse("y").unwrap(), RepetitionRule::Yearly);
    assert_eq!(RepetitionRule::parse("d 7").unwrap(), RepetitionRule::EveryNDays(7));
    assert_eq!(
        RepetitionRule::parse("w 1,3,7").unwrap(),
        RepetitionRule::WeeklyOnDays(set(&[1, 3, 7]))
    );
    assert_eq!(
        RepetitionRule::parse("m 1,-1").unwrap(),
        RepetitionRule::MonthlyOnDays {
            days: set(&[1, -1]),
            months: BTreeSet::new(),
        }
    );
    assert_eq!(
        RepetitionRule::parse("m -2 1,7").unwrap(),
        RepetitionRule::MonthlyOnDays {
            days: set(&[-2]),
            months: set(&[1, 7]),
        }
    );
}

#[test]
fn interval_bounds_are_inclusive() {
    assert_eq!(RepetitionRule::parse("d 1").unwrap(), RepetitionRule::EveryNDays(1));
    assert_eq!(RepetitionRule::parse("d 400").unwrap(), RepetitionRule::EveryNDays(400));
}

#[test]
fn leading_zeros_are_plain_integers() {
    assert_eq!(
        RepetitionRule::parse("m 07,19 05,6").unwrap(),
        RepetitionRule::MonthlyOnDays {
            days: set(&[7, 19]),
            months: set(&[5, 6]),
        }
    );
}

// ── Rejected rules ──────────────────────────────────────────────────────────

#[test]
fn empty_rule_is_rejected() {
    assert!(is_invalid_rule(RepetitionRule::parse("")));
}

#[test]
fn more_than_three_tokens_is_rejected() {
    assert!(is_invalid_rule(RepetitionRule::parse("m 1 2 3")));
}

#[test]
fn unknown_tag_is_rejected() {
    assert!(is_invalid_rule(RepetitionRule::parse("k 34")));
    assert!(is_invalid_rule(RepetitionRule::parse("ooops")));
}

#[test]
fn wrong_token_counts_are_rejected() {
    for bad in ["y 1", "d", "d 1 2", "w", "w 1 2", "m"] {
        assert!(is_invalid_rule(RepetitionRule::parse(bad)), "{bad:?}");
    }
}

#[test]
fn extra_spaces_produce_empty_tokens() {
    assert!(is_invalid_rule(RepetitionRule::parse("d  7")));
    assert!(is_invalid_rule(RepetitionRule::parse("y ")));
    assert!(is_invalid_rule(RepetitionRule::parse(" y")));
}

#[test]
fn non_integers_are_parse_errors() {
    assert!(is_invalid_rule(RepetitionRule::parse("d abc")));
    assert!(is_invalid_rule(RepetitionRule::parse("w 1,,2")));
    assert!(is_invalid_rule(RepetitionRule::parse("m 1,x")));
}

#[test]
fn out_of_range_values_report_field_and_value() {
    let cases = [
        ("d 0", "day interval", 0),
        ("d 401", "day interval", 401),
        ("w 0", "weekday", 0),
        ("w 8,4,5", "weekday", 8),
        ("m 0", "day of month", 0),
        ("m -3", "day of month", -3),
        ("m 32", "day of month", 32),
        ("m 1 13", "month", 13),
        ("m 1 0", "month", 0),
    ];
    for (rule, field, value) in cases {
        assert_eq!(
            RepetitionRule::parse(rule),
            Err(ScheduleError::OutOfRange { field, value }),
            "{rule:?}"
        );
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

#[test]
fn display_is_canonical() {
    assert_eq!(RepetitionRule::parse("w 7,1,1").unwrap().to_string(), "w 1,7");
    assert_eq!(
        RepetitionRule::parse("m 5,-1 7,1").unwrap().to_string(),
        "m -1,5 1,7"
    );
    assert_eq!(RepetitionRule::parse("d 14").unwrap().to_string(), "d 14");
}

#[test]
fn serializes_as_rule_string() {
    let rule = RepetitionRule::parse("m -1").unwrap();
    assert_eq!(serde_json::to_string(&rule).unwrap(), "\"m -1\"");
    let back: RepetitionRule = serde_json::from_str("\"w 2,4\"").unwrap();
    assert_eq!(back, RepetitionRule::WeeklyOnDays(set(&[2, 4])));
    assert!(serde_json::from_str::<RepetitionRule>("\"w 9\"").is_err());
}

// ── Calendar membership ─────────────────────────────────────────────────────

#[test]
fn weekday_seven_is_sunday() {
    let rule = RepetitionRule::parse("w 7").unwrap();
    assert!(rule.matches_calendar(date(2024, 1, 28))); // Sunday
    assert!(!rule.matches_calendar(date(2024, 1, 29))); // Monday
}

#[test]
fn month_restriction_applies() {
    let rule = RepetitionRule::parse("m -1 2").unwrap();
    assert!(rule.matches_calendar(date(2024, 2, 29)));
    assert!(!rule.matches_calendar(date(2024, 2, 28)));
    assert!(!rule.matches_calendar(date(2024, 3, 31)));
}
