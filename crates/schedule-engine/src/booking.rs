//! Service bookings and their lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::ScheduleError;

/// Store-assigned booking identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookingId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(BookingId)
    }
}

/// Where a booking is in its visit. Transitions are driven by staff; the
/// engine only cares which statuses still occupy their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookingStatus {
    #[default]
    #[serde(rename = "wait")]
    Waiting,
    #[serde(rename = "welcome")]
    Welcomed,
    #[serde(rename = "in work")]
    InProgress,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "cancel")]
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Waiting,
        BookingStatus::Welcomed,
        BookingStatus::InProgress,
        BookingStatus::Done,
        BookingStatus::Cancelled,
    ];

    /// Statuses that still hold their slot.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Waiting,
        BookingStatus::Welcomed,
        BookingStatus::InProgress,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Waiting => "wait",
            BookingStatus::Welcomed => "welcome",
            BookingStatus::InProgress => "in work",
            BookingStatus::Done => "done",
            BookingStatus::Cancelled => "cancel",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ScheduleError::InvalidStatus(s.to_string()))
    }
}

/// Client-supplied booking fields, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub title: String,
    #[serde(default)]
    pub comment: String,
    /// `None` books a place in the walk-in queue rather than a slot.
    #[serde(default, alias = "record")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    #[serde(default, alias = "record")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(alias = "date")]
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    /// The `[start, start + slot)` window this booking claims, if it claims
    /// one at all. Queue bookings and finished or cancelled bookings occupy
    /// nothing. A window running past the end of time is cut off there.
    pub fn occupancy(&self, slot: Duration) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self.scheduled_at {
            Some(start) if self.status.is_active() => {
                Some((start, calendar::saturating_add(start, slot)))
            }
            _ => None,
        }
    }

    /// Ticket shown to the customer: `A` for an appointment or `Q` for a queue
    /// place, then the last three digits of the id.
    pub fn ticket_number(&self) -> String {
        let prefix = if self.scheduled_at.is_some() { 'A' } else { 'Q' };
        format!("{}{:03}", prefix, self.id.0 % 1000)
    }
}
