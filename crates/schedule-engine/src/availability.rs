//! Free slots for a day.
//!
//! Availability is the slot grid from [`BusinessHours::slots_for_day`] minus
//! every slot an active booking occupies. The occupancy test is the same one
//! [`BookingValidator`](crate::validator::BookingValidator) uses for its
//! `SlotTaken` check, so a listed slot never fails validation for occupancy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::Booking;
use crate::hours::{BusinessHours, Slot};
use crate::validator::find_occupant;

/// Response shape for a day's availability: `{"day": "...", "slots": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub day: NaiveDate,
    pub slots: Vec<Slot>,
}

/// Slots on `day` that are bookable at `now` and for which `is_occupied`
/// returns `false`, in ascending order.
///
/// A day that is entirely in the past yields an empty list.
pub fn available_slots<F>(
    hours: &BusinessHours,
    day: NaiveDate,
    now: DateTime<Utc>,
    mut is_occupied: F,
) -> Vec<Slot>
where
    F: FnMut(DateTime<Utc>) -> bool,
{
    hours
        .slots_for_day(day, now)
        .filter(|slot| !is_occupied(slot.start))
        .collect()
}

/// Build an occupancy lookup over a snapshot of bookings.
pub fn occupancy_lookup<'b>(
    hours: &BusinessHours,
    bookings: &'b [Booking],
) -> impl Fn(DateTime<Utc>) -> bool + 'b {
    let slot = hours.slot_duration();
    move |start| find_occupant(start, slot, None, bookings).is_some()
}

/// [`available_slots`] against a snapshot of bookings, wrapped for the wire.
pub fn day_availability(
    hours: &BusinessHours,
    day: NaiveDate,
    now: DateTime<Utc>,
    bookings: &[Booking],
) -> DayAvailability {
    DayAvailability {
        day,
        slots: available_slots(hours, day, now, occupancy_lookup(hours, bookings)),
    }
}
