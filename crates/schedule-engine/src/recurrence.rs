//! Next-occurrence computation for repeating tasks.
//!
//! The next occurrence of a rule is the earliest date that
//!
//! 1. is strictly after the task's start date (a rule never fires on its own
//!    start date, so completing a task always moves it forward),
//! 2. is not before the reference date, and
//! 3. satisfies the rule.
//!
//! Anchored rules (`y`, `d <n>`) step forward from the start date. Calendar
//! rules (`w`, `m`) are scanned one day at a time because month lengths make
//! their occurrence sets irregular.

use chrono::{Days, NaiveDate};

use crate::calendar;
use crate::error::{Result, ScheduleError};
use crate::rule::RepetitionRule;

/// Upper bound on a day-by-day scan. Twelve years covers the longest gap
/// between two February 29ths (across a skipped century leap year).
const SCAN_HORIZON_DAYS: u64 = 366 * 12;

/// Inputs to a single next-occurrence computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceQuery {
    /// The task's current date; occurrences are strictly after it.
    pub start: NaiveDate,
    pub rule: RepetitionRule,
    /// Occurrences must fall on or after this date.
    pub reference: NaiveDate,
}

impl RecurrenceQuery {
    pub fn new(start: NaiveDate, rule: RepetitionRule, reference: NaiveDate) -> Self {
        Self {
            start,
            rule,
            reference,
        }
    }
}

/// Compute the next occurrence for `query`.
///
/// # Errors
/// Returns [`ScheduleError::NoOccurrence`] when the rule cannot fire within the
/// search horizon (e.g. `m 31 2`, the 31st of February) or the calendar range
/// is exhausted.
pub fn next_occurrence(query: &RecurrenceQuery) -> Result<NaiveDate> {
    let no_occurrence = || ScheduleError::NoOccurrence(query.rule.to_string());

    let day_after_start = query.start.succ_opt().ok_or_else(no_occurrence)?;
    let floor = day_after_start.max(query.reference);

    match &query.rule {
        RepetitionRule::Yearly => {
            // Steps accumulate: a Feb 29 start rolls to Mar 1 and stays there.
            let mut date = query.start;
            while date < floor {
                date = calendar::add_years(date, 1).ok_or_else(no_occurrence)?;
            }
            Ok(date)
        }
        RepetitionRule::EveryNDays(n) => {
            let n = u64::from(*n);
            let gap = (floor - query.start).num_days() as u64;
            let steps = gap.div_ceil(n);
            query
                .start
                .checked_add_days(Days::new(steps * n))
                .ok_or_else(no_occurrence)
        }
        RepetitionRule::WeeklyOnDays(_) | RepetitionRule::MonthlyOnDays { .. } => {
            (0..SCAN_HORIZON_DAYS)
                .map_while(|offset| floor.checked_add_days(Days::new(offset)))
                .find(|date| query.rule.matches_calendar(*date))
                .ok_or_else(no_occurrence)
        }
    }
}

/// String-level entry point used by the HTTP layer.
///
/// Parses `start` as `YYYYMMDD` and `rule` with [`RepetitionRule::parse`], then
/// formats the next occurrence as `YYYYMMDD`. The start date is validated
/// before the rule.
pub fn next_date(start: &str, rule: &str, reference: NaiveDate) -> Result<String> {
    let start = calendar::parse_date(start)?;
    let rule = RepetitionRule::parse(rule)?;
    let next = next_occurrence(&RecurrenceQuery::new(start, rule, reference))?;
    Ok(calendar::format_date(next))
}

/// Successive occurrences of a rule from a fixed start date.
///
/// Each item is the next occurrence with the reference advanced to the day
/// after the previous item. The iterator ends if the rule stops producing
/// dates.
#[derive(Debug, Clone)]
pub struct Occurrences {
    start: NaiveDate,
    rule: RepetitionRule,
    reference: Option<NaiveDate>,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let reference = self.reference?;
        let query = RecurrenceQuery::new(self.start, self.rule.clone(), reference);
        match next_occurrence(&query) {
            Ok(date) => {
                self.reference = date.succ_opt();
                Some(date)
            }
            Err(_) => {
                self.reference = None;
                None
            }
        }
    }
}

/// Iterate over the occurrences of `rule` after `start`, beginning at
/// `reference`.
pub fn occurrences(start: NaiveDate, rule: RepetitionRule, reference: NaiveDate) -> Occurrences {
    Occurrences {
        start,
        rule,
        reference: Some(reference),
    }
}
