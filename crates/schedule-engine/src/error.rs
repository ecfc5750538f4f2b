//! Error types for schedule-engine operations.

use thiserror::Error;

use crate::booking::BookingId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid date '{0}': expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Unsupported repeat format: {0}")]
    InvalidRule(String),

    #[error("Value {value} is out of range for {field}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("No occurrence of '{0}' within the search horizon")]
    NoOccurrence(String),

    #[error("Booking time is too close to the current time")]
    TooClose,

    #[error("Booking time is before opening hours")]
    TooEarly,

    #[error("Booking time is at or after closing time")]
    TooLate,

    #[error("Booking time is not aligned to the slot interval")]
    NotAligned,

    #[error("Booking time is already taken by booking {id}")]
    SlotTaken { id: BookingId },

    #[error("Booking {0} not found")]
    NotFound(BookingId),

    #[error("Slot was claimed by booking {0} before this booking could be saved")]
    Conflict(BookingId),

    #[error("Invalid booking: {0}")]
    InvalidBooking(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid status '{0}'")]
    InvalidStatus(String),

    #[error("Invalid business hours: {0}")]
    InvalidConfig(String),
}

impl ScheduleError {
    /// True for errors the client can fix by choosing another time or
    /// correcting the request body (HTTP 400 territory).
    pub fn is_booking_rejection(&self) -> bool {
        matches!(
            self,
            ScheduleError::TooClose
                | ScheduleError::TooEarly
                | ScheduleError::TooLate
                | ScheduleError::NotAligned
                | ScheduleError::SlotTaken { .. }
                | ScheduleError::InvalidBooking(_)
                | ScheduleError::InvalidStatus(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
