//! Booking time validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. lead time ([`ScheduleError::TooClose`])
//! 2. opening time ([`ScheduleError::TooEarly`])
//! 3. closing time ([`ScheduleError::TooLate`])
//! 4. grid alignment ([`ScheduleError::NotAligned`])
//! 5. occupancy ([`ScheduleError::SlotTaken`])
//!
//! Validation is a pure predicate over the bookings it is handed. It does not
//! protect against another booking being written between validation and
//! commit; the store re-checks occupancy atomically when it writes.

use chrono::{DateTime, Duration, Utc};

use crate::booking::{Booking, BookingId};
use crate::calendar;
use crate::error::{Result, ScheduleError};
use crate::hours::BusinessHours;

/// Validates candidate booking times against one set of business hours.
#[derive(Debug, Clone, Copy)]
pub struct BookingValidator<'a> {
    hours: &'a BusinessHours,
}

impl<'a> BookingValidator<'a> {
    pub fn new(hours: &'a BusinessHours) -> Self {
        Self { hours }
    }

    /// Run all five checks.
    ///
    /// `bookings` only needs to contain bookings whose window could touch the
    /// candidate's; extra bookings are harmless. The booking with id
    /// `exclude` is ignored, which lets a booking be moved within its own
    /// window.
    pub fn validate<'b, I>(
        &self,
        candidate: DateTime<Utc>,
        exclude: Option<BookingId>,
        bookings: I,
        now: DateTime<Utc>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'b Booking>,
    {
        let candidate = calendar::truncate_to_minute(candidate);
        self.check_schedule(candidate, now)?;

        match find_occupant(candidate, self.hours.slot_duration(), exclude, bookings) {
            Some(occupant) => Err(ScheduleError::SlotTaken { id: occupant.id }),
            None => Ok(()),
        }
    }

    /// Checks 1–4: everything that does not depend on other bookings.
    pub fn check_schedule(&self, candidate: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        let candidate = calendar::truncate_to_minute(candidate);

        if !self.hours.meets_lead_time(candidate, now) {
            return Err(ScheduleError::TooClose);
        }

        // Past the end of the calendar there is no closing time to compare against.
        let time = match calendar::to_local(candidate, self.hours.timezone()) {
            Some(local) => local.time(),
            None => return Err(ScheduleError::TooLate),
        };
        if time < self.hours.open() {
            return Err(ScheduleError::TooEarly);
        }
        if time >= self.hours.close() {
            return Err(ScheduleError::TooLate);
        }

        if calendar::minutes_of_day(time) % self.hours.slot_interval_minutes() != 0 {
            return Err(ScheduleError::NotAligned);
        }

        Ok(())
    }
}

/// First active booking (other than `exclude`) whose window overlaps
/// `[candidate, candidate + slot)`.
///
/// Windows that merely touch (one ends exactly when the other starts) do not
/// overlap.
pub fn find_occupant<'b, I>(
    candidate: DateTime<Utc>,
    slot: Duration,
    exclude: Option<BookingId>,
    bookings: I,
) -> Option<&'b Booking>
where
    I: IntoIterator<Item = &'b Booking>,
{
    let candidate_end = calendar::saturating_add(candidate, slot);
    bookings.into_iter().find(|booking| {
        if Some(booking.id) == exclude {
            return false;
        }
        match booking.occupancy(slot) {
            Some((start, end)) => start < candidate_end && candidate < end,
            None => false,
        }
    })
}
