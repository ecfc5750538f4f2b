//! Repetition rule grammar.
//!
//! A rule is at most three space-separated tokens: a one-letter tag followed
//! by comma-separated integer lists.
//!
//! | rule          | meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `y`           | every year on the start date                         |
//! | `d 7`         | every 7 days (1..=400)                               |
//! | `w 1,3,7`     | Mondays, Wednesdays and Sundays (1 = Mon .. 7 = Sun) |
//! | `m 1,-1`      | first and last day of every month                    |
//! | `m -2 1,7`    | second-to-last day of January and July               |
//!
//! All validation happens here; a parsed rule always evaluates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar;
use crate::error::{Result, ScheduleError};

/// Largest accepted `d <n>` interval.
pub const MAX_DAY_INTERVAL: u32 = 400;

const MAX_TOKENS: usize = 3;

/// A parsed repetition rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepetitionRule {
    /// `y`: the start date plus whole years.
    Yearly,
    /// `d <n>`: the start date plus multiples of `n` days.
    EveryNDays(u32),
    /// `w <days>`: ISO weekday numbers, 1 (Monday) to 7 (Sunday).
    WeeklyOnDays(BTreeSet<u8>),
    /// `m <days> [<months>]`: days of month (`-1`/`-2` count from the end),
    /// optionally restricted to the listed months. Empty `months` means all.
    MonthlyOnDays {
        days: BTreeSet<i32>,
        months: BTreeSet<u32>,
    },
}

impl RepetitionRule {
    /// Parse a rule string. Equivalent to `s.parse()`.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Whether `date` belongs to the rule's calendar pattern.
    ///
    /// For `Yearly` and `EveryNDays` membership depends on the start date, so
    /// this only answers for the calendar-driven variants and returns `true`
    /// for the anchored ones.
    pub fn matches_calendar(&self, date: NaiveDate) -> bool {
        match self {
            RepetitionRule::Yearly | RepetitionRule::EveryNDays(_) => true,
            RepetitionRule::WeeklyOnDays(days) => {
                days.contains(&(date.weekday().number_from_monday() as u8))
            }
            RepetitionRule::MonthlyOnDays { days, months } => {
                if !months.is_empty() && !months.contains(&date.month()) {
                    return false;
                }
                days.iter().any(|&selector| {
                    calendar::resolve_month_day(date.year(), date.month(), selector)
                        == Some(date.day())
                })
            }
        }
    }
}

impl FromStr for RepetitionRule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(ScheduleError::InvalidRule(
                "repeat cannot be an empty value".to_string(),
            ));
        }

        // Single spaces only: doubled or trailing spaces yield empty tokens,
        // which then fail the arity or integer checks below.
        let tokens: Vec<&str> = s.split(' ').collect();
        if tokens.len() > MAX_TOKENS {
            return Err(ScheduleError::InvalidRule(format!(
                "'{}' has more than {} tokens",
                s, MAX_TOKENS
            )));
        }

        match tokens[0] {
            "y" => {
                expect_arity(s, &tokens, 1, 1)?;
                Ok(RepetitionRule::Yearly)
            }
            "d" => {
                expect_arity(s, &tokens, 2, 2)?;
                let n = parse_int(tokens[1])?;
                if !(1..=MAX_DAY_INTERVAL as i64).contains(&n) {
                    return Err(ScheduleError::OutOfRange {
                        field: "day interval",
                        value: n,
                    });
                }
                Ok(RepetitionRule::EveryNDays(n as u32))
            }
            "w" => {
                expect_arity(s, &tokens, 2, 2)?;
                let days = parse_list(tokens[1], "weekday", |v| (1..=7).contains(&v))?
                    .into_iter()
                    .map(|v| v as u8)
                    .collect();
                Ok(RepetitionRule::WeeklyOnDays(days))
            }
            "m" => {
                expect_arity(s, &tokens, 2, 3)?;
                let days = parse_list(tokens[1], "day of month", |v| {
                    (1..=31).contains(&v) || v == -1 || v == -2
                })?
                .into_iter()
                .map(|v| v as i32)
                .collect();
                let months = match tokens.get(2) {
                    Some(raw) => parse_list(raw, "month", |v| (1..=12).contains(&v))?
                        .into_iter()
                        .map(|v| v as u32)
                        .collect(),
                    None => BTreeSet::new(),
                };
                Ok(RepetitionRule::MonthlyOnDays { days, months })
            }
            other => Err(ScheduleError::InvalidRule(format!(
                "unknown repeat rule '{}'",
                other
            ))),
        }
    }
}

fn expect_arity(rule: &str, tokens: &[&str], min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&tokens.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{}-{}", min, max)
    };
    Err(ScheduleError::InvalidRule(format!(
        "'{}' expects {} token(s), got {} in '{}'",
        tokens[0],
        expected,
        tokens.len(),
        rule
    )))
}

fn parse_int(token: &str) -> Result<i64> {
    token
        .parse::<i64>()
        .map_err(|_| ScheduleError::InvalidRule(format!("'{}' is not an integer", token)))
}

fn parse_list(
    token: &str,
    field: &'static str,
    in_range: impl Fn(i64) -> bool,
) -> Result<BTreeSet<i64>> {
    token
        .split(',')
        .map(|part| {
            let value = parse_int(part)?;
            if in_range(value) {
                Ok(value)
            } else {
                Err(ScheduleError::OutOfRange { field, value })
            }
        })
        .collect()
}

fn join<T: fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for RepetitionRule {
    /// Renders the canonical rule string (sorted, de-duplicated lists).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepetitionRule::Yearly => write!(f, "y"),
            RepetitionRule::EveryNDays(n) => write!(f, "d {}", n),
            RepetitionRule::WeeklyOnDays(days) => write!(f, "w {}", join(days)),
            RepetitionRule::MonthlyOnDays { days, months } if months.is_empty() => {
                write!(f, "m {}", join(days))
            }
            RepetitionRule::MonthlyOnDays { days, months } => {
                write!(f, "m {} {}", join(days), join(months))
            }
        }
    }
}

impl Serialize for RepetitionRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepetitionRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
