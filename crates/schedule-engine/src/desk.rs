//! Booking service used by the HTTP layer.
//!
//! [`BookingDesk`] owns the business hours and a [`BookingStore`]. Every call
//! re-reads the bookings it needs from the store; nothing is cached between
//! calls.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::availability::{day_availability, DayAvailability};
use crate::booking::{Booking, BookingId, BookingStatus, NewBooking};
use crate::calendar;
use crate::error::{Result, ScheduleError};
use crate::hours::BusinessHours;
use crate::store::BookingStore;
use crate::validator::BookingValidator;

pub struct BookingDesk<S> {
    hours: BusinessHours,
    store: S,
}

impl<S: BookingStore> BookingDesk<S> {
    pub fn new(hours: BusinessHours, store: S) -> Self {
        Self { hours, store }
    }

    pub fn hours(&self) -> &BusinessHours {
        &self.hours
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Free slots on local calendar day `day` as seen at `now`.
    pub fn available_slots(&self, day: NaiveDate, now: DateTime<Utc>) -> Result<DayAvailability> {
        let (day_start, day_end) = calendar::local_day_bounds(day, self.hours.timezone());
        // A booking that starts just before midnight can still spill into the day.
        let from = calendar::saturating_sub(day_start, self.hours.slot_duration());
        let bookings = self.store.overlapping(from, day_end)?;

        let availability = day_availability(&self.hours, day, now, &bookings);
        debug!(
            %day,
            free = availability.slots.len(),
            booked = bookings.len(),
            "computed availability"
        );
        Ok(availability)
    }

    /// Check whether `candidate` could be booked right now.
    pub fn validate(
        &self,
        candidate: DateTime<Utc>,
        exclude: Option<BookingId>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let validator = BookingValidator::new(&self.hours);
        let candidate = calendar::truncate_to_minute(candidate);
        validator.check_schedule(candidate, now)?;

        let slot = self.hours.slot_duration();
        let neighbours = self.store.overlapping(
            calendar::saturating_sub(candidate, slot),
            calendar::saturating_add(candidate, slot),
        )?;
        validator.validate(candidate, exclude, &neighbours, now)
    }

    /// Validate and store a new booking. Queue bookings (no time) skip the
    /// time checks.
    pub fn create(&self, booking: NewBooking, now: DateTime<Utc>) -> Result<Booking> {
        let booking = self.prepare(booking, None, now)?;
        self.store.insert(booking, now, self.hours.slot_duration())
    }

    /// Replace the title, comment and time of an existing booking. Its own
    /// current slot does not count as taken.
    pub fn reschedule(
        &self,
        id: BookingId,
        changes: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let existing = self.store.get(id)?;
        let changes = self.prepare(changes, Some(id), now)?;
        let updated = Booking {
            id,
            scheduled_at: changes.scheduled_at,
            created_at: existing.created_at,
            title: changes.title,
            comment: changes.comment,
            status: existing.status,
        };
        self.store.update(updated, self.hours.slot_duration())
    }

    pub fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking> {
        self.store.set_status(id, status)
    }

    pub fn remove(&self, id: BookingId) -> Result<Booking> {
        self.store.remove(id)
    }

    /// Scheduled bookings on local day `day`, ordered by time. Without a
    /// filter, cancelled bookings are left out.
    pub fn bookings_on(
        &self,
        day: NaiveDate,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>> {
        let (day_start, day_end) = calendar::local_day_bounds(day, self.hours.timezone());
        let mut bookings = self.store.overlapping(day_start, day_end)?;
        bookings.retain(|b| match status {
            Some(wanted) => b.status == wanted,
            None => b.status != BookingStatus::Cancelled,
        });
        Ok(bookings)
    }

    /// All bookings, newest first, one page at a time.
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<Booking>> {
        self.store.list(limit, offset)
    }

    /// Every booking with `status`, on any day.
    pub fn by_status(&self, status: BookingStatus) -> Result<Vec<Booking>> {
        self.store.with_statuses(&[status])
    }

    /// The working list: bookings still holding their place, queue first,
    /// then by time.
    pub fn active(&self) -> Result<Vec<Booking>> {
        self.store.with_statuses(&BookingStatus::ACTIVE)
    }

    fn prepare(
        &self,
        mut booking: NewBooking,
        exclude: Option<BookingId>,
        now: DateTime<Utc>,
    ) -> Result<NewBooking> {
        if booking.title.trim().is_empty() {
            return Err(ScheduleError::InvalidBooking("title must not be empty".to_string()));
        }

        if let Some(at) = booking.scheduled_at {
            let at = calendar::truncate_to_minute(at);
            if let Err(e) = self.validate(at, exclude, now) {
                warn!(%at, error = %e, "booking time rejected");
                return Err(e);
            }
            booking.scheduled_at = Some(at);
        }
        Ok(booking)
    }
}
