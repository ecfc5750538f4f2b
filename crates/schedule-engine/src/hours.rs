//! Business hours and the per-day slot grid.
//!
//! A day is divided into fixed-length slots whose start times are multiples
//! of the slot interval counted from local midnight, limited to
//! `[open, close)`. Slots closer to "now" than the minimum lead time are not
//! offered.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{Result, ScheduleError};

const MINUTES_PER_DAY: u32 = 24 * 60;

const DEFAULT_OPEN: NaiveTime = time_of_day(9, 0);
const DEFAULT_CLOSE: NaiveTime = time_of_day(18, 0);
const DEFAULT_SLOT_INTERVAL_MINUTES: u32 = 30;

const fn time_of_day(hour: u32, min: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, 0) {
        Some(time) => time,
        None => panic!("invalid time of day"),
    }
}

/// Opening hours, slot length and lead time for the whole service.
///
/// Built once at startup and passed by reference into every engine call.
/// Deserializes from the flat [`HoursConfig`] shape, so it can be read
/// straight from a TOML or JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HoursConfig", into = "HoursConfig")]
pub struct BusinessHours {
    open: NaiveTime,
    close: NaiveTime,
    slot_interval_minutes: u32,
    min_lead_time: Duration,
    timezone: Tz,
}

impl BusinessHours {
    /// Hours in UTC with a lead time of one slot interval.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidConfig`] if `open` is not before `close` or the
    /// interval is outside `1..=1440` minutes.
    pub fn new(open: NaiveTime, close: NaiveTime, slot_interval_minutes: u32) -> Result<Self> {
        if slot_interval_minutes == 0 || slot_interval_minutes > MINUTES_PER_DAY {
            return Err(ScheduleError::InvalidConfig(format!(
                "slot interval must be between 1 and {} minutes, got {}",
                MINUTES_PER_DAY, slot_interval_minutes
            )));
        }
        if open >= close {
            return Err(ScheduleError::InvalidConfig(format!(
                "opening time {} must be before closing time {}",
                open.format("%H:%M"),
                close.format("%H:%M")
            )));
        }
        Ok(Self {
            open,
            close,
            slot_interval_minutes,
            min_lead_time: Duration::minutes(i64::from(slot_interval_minutes)),
            timezone: Tz::UTC,
        })
    }

    /// Replace the minimum lead time. Negative values are rejected.
    pub fn with_min_lead_time(mut self, lead: Duration) -> Result<Self> {
        if lead < Duration::zero() {
            return Err(ScheduleError::InvalidConfig(format!(
                "lead time must not be negative, got {} minutes",
                lead.num_minutes()
            )));
        }
        self.min_lead_time = lead;
        Ok(self)
    }

    /// Interpret opening hours in `zone` instead of UTC.
    pub fn with_timezone(mut self, zone: Tz) -> Self {
        self.timezone = zone;
        self
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    pub fn slot_interval_minutes(&self) -> u32 {
        self.slot_interval_minutes
    }

    /// Length of one slot, which is also how long a booking occupies.
    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_interval_minutes))
    }

    pub fn min_lead_time(&self) -> Duration {
        self.min_lead_time
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Whether `candidate` is at least the lead time after `now`, both
    /// truncated to the minute.
    pub fn meets_lead_time(&self, candidate: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        calendar::truncate_to_minute(candidate) - calendar::truncate_to_minute(now)
            >= self.min_lead_time
    }

    /// Candidate slots on local calendar day `day` that are still bookable at
    /// `now`, in ascending order.
    ///
    /// The iterator is cheap to clone, and calling this again with the same
    /// arguments yields the same sequence.
    pub fn slots_for_day(&self, day: NaiveDate, now: DateTime<Utc>) -> DaySlots<'_> {
        let interval = self.slot_interval_minutes;
        let open = calendar::minutes_of_day(self.open);
        DaySlots {
            hours: self,
            day,
            now,
            next_minute: open.div_ceil(interval) * interval,
            end_minute: calendar::minutes_of_day(self.close),
        }
    }
}

impl Default for BusinessHours {
    /// 09:00 to 18:00 UTC, 30-minute slots, 30-minute lead time.
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN,
            close: DEFAULT_CLOSE,
            slot_interval_minutes: DEFAULT_SLOT_INTERVAL_MINUTES,
            min_lead_time: Duration::minutes(i64::from(DEFAULT_SLOT_INTERVAL_MINUTES)),
            timezone: Tz::UTC,
        }
    }
}

/// A bookable start time. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot {
    pub start: DateTime<Utc>,
}

/// Iterator over the slots of one day. See [`BusinessHours::slots_for_day`].
#[derive(Debug, Clone)]
pub struct DaySlots<'a> {
    hours: &'a BusinessHours,
    day: NaiveDate,
    now: DateTime<Utc>,
    next_minute: u32,
    end_minute: u32,
}

impl Iterator for DaySlots<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        while self.next_minute < self.end_minute {
            let minute = self.next_minute;
            self.next_minute += self.hours.slot_interval_minutes;

            let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0) else {
                continue;
            };
            // Wall-clock times skipped by a DST jump have no slot.
            let Some(start) = calendar::local_to_utc(self.hours.timezone, self.day.and_time(time))
            else {
                continue;
            };
            if self.hours.meets_lead_time(start, self.now) {
                return Some(Slot { start });
            }
        }
        None
    }
}

/// On-disk shape of [`BusinessHours`].
///
/// ```toml
/// open = "09:00"
/// close = "18:00"
/// slot_interval_minutes = 30
/// min_lead_minutes = 30     # optional, defaults to one interval
/// timezone = "Europe/Moscow"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HoursConfig {
    pub open: String,
    pub close: String,
    pub slot_interval_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_lead_minutes: Option<i64>,
    pub timezone: String,
}

impl Default for HoursConfig {
    /// [`BusinessHours::default`], with the lead time left to follow the interval.
    fn default() -> Self {
        Self {
            min_lead_minutes: None,
            ..HoursConfig::from(BusinessHours::default())
        }
    }
}

fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| {
        ScheduleError::InvalidConfig(format!("{} must be HH:MM, got '{}'", field, raw))
    })
}

impl TryFrom<HoursConfig> for BusinessHours {
    type Error = ScheduleError;

    fn try_from(config: HoursConfig) -> Result<Self> {
        let open = parse_time_of_day("open", &config.open)?;
        let close = parse_time_of_day("close", &config.close)?;
        let zone: Tz = config.timezone.parse().map_err(|_| {
            ScheduleError::InvalidConfig(format!("unknown timezone '{}'", config.timezone))
        })?;

        let hours =
            BusinessHours::new(open, close, config.slot_interval_minutes)?.with_timezone(zone);
        match config.min_lead_minutes {
            Some(minutes) => {
                let lead = Duration::try_minutes(minutes).ok_or_else(|| {
                    ScheduleError::InvalidConfig(format!(
                        "lead time of {} minutes is too large",
                        minutes
                    ))
                })?;
                hours.with_min_lead_time(lead)
            }
            None => Ok(hours),
        }
    }
}

impl From<BusinessHours> for HoursConfig {
    fn from(hours: BusinessHours) -> Self {
        Self {
            open: hours.open.format("%H:%M").to_string(),
            close: hours.close.format("%H:%M").to_string(),
            slot_interval_minutes: hours.slot_interval_minutes,
            min_lead_minutes: Some(hours.min_lead_time.num_minutes()),
            timezone: hours.timezone.name().to_string(),
        }
    }
}
