//! # schedule-engine
//!
//! Date logic for a small service shop: recurring reminder tasks and
//! slot-based appointment booking against fixed business hours.
//!
//! The two halves are independent. Recurrence works on calendar dates only;
//! booking works on UTC instants compared in the shop's configured time zone.
//!
//! ## Modules
//!
//! - [`calendar`]: `YYYYMMDD` dates, month-end resolution, local/UTC mapping
//! - [`rule`]: repetition rule grammar (`y`, `d 7`, `w 1,5`, `m -1 1,7`)
//! - [`recurrence`]: next occurrence of a rule after a start date
//! - [`task`]: saving, completing and searching repeating tasks
//! - [`hours`]: business hours and the daily slot grid
//! - [`booking`]: bookings, statuses, ticket numbers
//! - [`validator`]: checks a candidate booking time
//! - [`availability`]: free slots for a day
//! - [`store`]: persistence seam with an in-memory implementation
//! - [`desk`]: booking service combining the above
//! - [`error`]: Error types

pub mod availability;
pub mod booking;
pub mod calendar;
pub mod desk;
pub mod error;
pub mod hours;
pub mod recurrence;
pub mod rule;
pub mod store;
pub mod task;
pub mod validator;

pub use availability::{available_slots, DayAvailability};
pub use booking::{Booking, BookingId, BookingStatus, NewBooking};
pub use desk::BookingDesk;
pub use error::ScheduleError;
pub use hours::{BusinessHours, Slot};
pub use recurrence::{next_date, next_occurrence, occurrences, RecurrenceQuery};
pub use rule::RepetitionRule;
pub use store::{BookingStore, InMemoryBookingStore};
pub use task::{search_tasks, Task, TaskCompletion, TaskDraft, TaskFilter, TASK_PAGE_LIMIT};
pub use validator::BookingValidator;
