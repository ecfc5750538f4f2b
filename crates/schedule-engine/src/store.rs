//! Booking persistence.
//!
//! The engine reads bookings through [`BookingStore::overlapping`] and writes
//! them through `insert`/`update`. Validation happens outside the store, so two
//! requests can both validate the same free slot; every implementation must
//! therefore re-check occupancy inside the same atomic step as the write and
//! fail with [`ScheduleError::Conflict`] when it loses. A SQL store would do this
//! in a serializable transaction or with a constraint on the occupied window.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::booking::{Booking, BookingId, BookingStatus, NewBooking};
use crate::error::{Result, ScheduleError};
use crate::validator::find_occupant;

pub trait BookingStore: Send + Sync {
    /// Fetch one booking.
    fn get(&self, id: BookingId) -> Result<Booking>;

    /// Bookings of any status whose `scheduled_at` lies in `[start, end)`,
    /// ordered by `scheduled_at`. Queue bookings are never returned.
    fn overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>>;

    /// One page of all bookings, newest `created_at` first.
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Booking>>;

    /// Bookings in any of `statuses` across all days, queue bookings first,
    /// then by `scheduled_at` and `created_at`.
    fn with_statuses(&self, statuses: &[BookingStatus]) -> Result<Vec<Booking>>;

    /// Store a new booking with status `Waiting`.
    ///
    /// Fails with `Conflict` if an active booking already occupies any part of
    /// `[scheduled_at, scheduled_at + slot)` at the moment of the write.
    fn insert(&self, booking: NewBooking, created_at: DateTime<Utc>, slot: Duration)
        -> Result<Booking>;

    /// Replace a stored booking, with the same occupancy guarantee as
    /// [`insert`](BookingStore::insert). The booking never conflicts with its
    /// own previous version.
    fn update(&self, booking: Booking, slot: Duration) -> Result<Booking>;

    /// Change only the status. Never conflicts: reactivating a booking whose
    /// slot was re-let is left to staff.
    fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking>;

    fn remove(&self, id: BookingId) -> Result<Booking>;
}

#[derive(Debug, Default)]
struct Ledger {
    last_id: u64,
    bookings: BTreeMap<BookingId, Booking>,
}

impl Ledger {
    fn claim_check(&self, candidate: &Booking, slot: Duration) -> Result<()> {
        let Some((start, _)) = candidate.occupancy(slot) else {
            return Ok(());
        };
        match find_occupant(start, slot, Some(candidate.id), self.bookings.values()) {
            Some(occupant) => {
                warn!(
                    booking = %candidate.id,
                    occupant = %occupant.id,
                    at = %start,
                    "slot claimed concurrently, rejecting write"
                );
                Err(ScheduleError::Conflict(occupant.id))
            }
            None => Ok(()),
        }
    }
}

/// Process-local store; the write lock makes check-and-write atomic.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with existing bookings (e.g. loaded from a
    /// file). New ids continue after the largest seeded id.
    pub fn with_bookings(bookings: impl IntoIterator<Item = Booking>) -> Self {
        let mut ledger = Ledger::default();
        for booking in bookings {
            ledger.last_id = ledger.last_id.max(booking.id.0);
            ledger.bookings.insert(booking.id, booking);
        }
        Self {
            ledger: RwLock::new(ledger),
        }
    }

    pub fn len(&self) -> usize {
        self.ledger.read().bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BookingStore for InMemoryBookingStore {
    fn get(&self, id: BookingId) -> Result<Booking> {
        self.ledger
            .read()
            .bookings
            .get(&id)
            .cloned()
            .ok_or(ScheduleError::NotFound(id))
    }

    fn overlapping(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>> {
        let ledger = self.ledger.read();
        let mut found: Vec<Booking> = ledger
            .bookings
            .values()
            .filter(|b| b.scheduled_at.is_some_and(|at| start <= at && at < end))
            .cloned()
            .collect();
        found.sort_by_key(|b| (b.scheduled_at, b.id));
        Ok(found)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Booking>> {
        let ledger = self.ledger.read();
        let mut all: Vec<&Booking> = ledger.bookings.values().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all.into_iter().skip(offset).take(limit).cloned().collect())
    }

    fn with_statuses(&self, statuses: &[BookingStatus]) -> Result<Vec<Booking>> {
        let ledger = self.ledger.read();
        let mut found: Vec<Booking> = ledger
            .bookings
            .values()
            .filter(|b| statuses.contains(&b.status))
            .cloned()
            .collect();
        found.sort_by_key(|b| (b.scheduled_at, b.created_at, b.id));
        Ok(found)
    }

    fn insert(
        &self,
        booking: NewBooking,
        created_at: DateTime<Utc>,
        slot: Duration,
    ) -> Result<Booking> {
        let mut ledger = self.ledger.write();
        let stored = Booking {
            id: BookingId(ledger.last_id + 1),
            scheduled_at: booking.scheduled_at,
            created_at,
            title: booking.title,
            comment: booking.comment,
            status: BookingStatus::Waiting,
        };
        ledger.claim_check(&stored, slot)?;

        ledger.last_id = stored.id.0;
        ledger.bookings.insert(stored.id, stored.clone());
        info!(booking = %stored.id, ticket = %stored.ticket_number(), "booking stored");
        Ok(stored)
    }

    fn update(&self, booking: Booking, slot: Duration) -> Result<Booking> {
        let mut ledger = self.ledger.write();
        if !ledger.bookings.contains_key(&booking.id) {
            return Err(ScheduleError::NotFound(booking.id));
        }
        ledger.claim_check(&booking, slot)?;

        ledger.bookings.insert(booking.id, booking.clone());
        info!(booking = %booking.id, "booking updated");
        Ok(booking)
    }

    fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking> {
        let mut ledger = self.ledger.write();
        let booking = ledger
            .bookings
            .get_mut(&id)
            .ok_or(ScheduleError::NotFound(id))?;
        booking.status = status;
        info!(booking = %id, status = %status, "booking status changed");
        Ok(booking.clone())
    }

    fn remove(&self, id: BookingId) -> Result<Booking> {
        let removed = self
            .ledger
            .write()
            .bookings
            .remove(&id)
            .ok_or(ScheduleError::NotFound(id))?;
        info!(booking = %id, "booking removed");
        Ok(removed)
    }
}
