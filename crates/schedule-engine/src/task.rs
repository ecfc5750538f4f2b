//! Repeating reminder tasks.
//!
//! A task carries a single date. Tasks dated in the past are pulled forward
//! when saved, and completing a repeating task moves it to its next
//! occurrence instead of removing it. Listings come from [`search_tasks`].

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{Result, ScheduleError};
use crate::recurrence::{next_occurrence, RecurrenceQuery};
use crate::rule::RepetitionRule;

/// A task as submitted by a client: every field is raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub id: Option<String>,
    /// `YYYYMMDD`, or empty for "today".
    pub date: String,
    pub title: String,
    pub comment: String,
    /// Rule string, or empty for a one-off task.
    pub repeat: String,
}

/// A validated task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(with = "calendar::yyyymmdd")]
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepetitionRule>,
}

/// What to do with a task once it has been marked done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCompletion {
    /// One-off task: delete it.
    Remove,
    /// Repeating task: keep it, moved to this date.
    Reschedule(NaiveDate),
}

impl Task {
    /// Validate a draft against `today`.
    ///
    /// - an empty title is rejected;
    /// - an empty date means `today`;
    /// - a past date becomes `today` for one-off tasks, or the first
    ///   occurrence after `today` for repeating ones.
    pub fn from_draft(draft: TaskDraft, today: NaiveDate) -> Result<Self> {
        if draft.title.trim().is_empty() {
            return Err(ScheduleError::InvalidTask("title must not be empty".to_string()));
        }

        let mut date = if draft.date.is_empty() {
            today
        } else {
            calendar::parse_date(&draft.date)?
        };

        let repeat = if draft.repeat.is_empty() {
            None
        } else {
            Some(RepetitionRule::parse(&draft.repeat)?)
        };

        if date < today {
            date = match &repeat {
                None => today,
                Some(rule) => next_after(date, rule, today)?,
            };
        }

        Ok(Task {
            id: draft.id,
            date,
            title: draft.title,
            comment: draft.comment,
            repeat,
        })
    }

    /// Decide what marking this task done on `today` does.
    pub fn complete(&self, today: NaiveDate) -> Result<TaskCompletion> {
        match &self.repeat {
            None => Ok(TaskCompletion::Remove),
            Some(rule) => next_after(self.date, rule, today).map(TaskCompletion::Reschedule),
        }
    }
}

/// First occurrence strictly after `today`.
fn next_after(start: NaiveDate, rule: &RepetitionRule, today: NaiveDate) -> Result<NaiveDate> {
    let reference = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ScheduleError::NoOccurrence(rule.to_string()))?;
    next_occurrence(&RecurrenceQuery::new(start, rule.clone(), reference))
}

/// Upper bound on the tasks returned by one search.
pub const TASK_PAGE_LIMIT: usize = 50;

/// Which tasks a search box query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    /// The query was a `DD.MM.YYYY` date: tasks on exactly that day.
    OnDate(NaiveDate),
    /// Case-insensitive substring of the title or comment.
    Text(String),
}

impl TaskFilter {
    /// Interpret raw search box input. Surrounding whitespace is ignored.
    pub fn parse(search: &str) -> Self {
        let search = search.trim();
        if search.is_empty() {
            return TaskFilter::All;
        }
        if search.len() == 10 {
            if let Ok(day) = NaiveDate::parse_from_str(search, "%d.%m.%Y") {
                return TaskFilter::OnDate(day);
            }
        }
        TaskFilter::Text(search.to_lowercase())
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::OnDate(day) => task.date == *day,
            TaskFilter::Text(needle) => {
                task.title.to_lowercase().contains(needle.as_str())
                    || task.comment.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

/// Tasks selected by `filter`, earliest date first, at most `limit` of them.
/// Ties on date keep insertion order by id.
pub fn search_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter, limit: usize) -> Vec<&'a Task> {
    let mut found: Vec<&Task> = tasks.iter().filter(|task| filter.matches(task)).collect();
    found.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| compare_ids(a, b)));
    found.truncate(limit);
    found
}

/// Numeric ids compare as numbers, so `"9"` sorts before `"10"`.
fn compare_ids(a: &Task, b: &Task) -> Ordering {
    let numeric = |task: &Task| task.id.as_deref().and_then(|id| id.parse::<u64>().ok());
    numeric(a).cmp(&numeric(b)).then_with(|| a.id.cmp(&b.id))
}
