//! WASM bindings for schedule-engine.
//!
//! Exposes next-date computation, free slot listing, booking validation and
//! task completion to the browser front end via `wasm-bindgen`. All complex
//! types are passed as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p schedule-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/pkg/ \
//!   target/wasm32-unknown-unknown/release/schedule_engine_wasm.wasm
//! ```

use std::fmt::Display;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use schedule_engine::availability::day_availability;
use schedule_engine::{
    calendar, Booking, BookingId, BookingValidator, BusinessHours, Task, TaskCompletion,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ValidationDto {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum CompletionDto {
    Remove,
    Reschedule { date: String },
}

impl From<TaskCompletion> for CompletionDto {
    fn from(completion: TaskCompletion) -> Self {
        match completion {
            TaskCompletion::Remove => CompletionDto::Remove,
            TaskCompletion::Reschedule(date) => CompletionDto::Reschedule {
                date: calendar::format_date(date),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

fn js_error(context: &str, e: impl Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, e))
}

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (e.g. "2024-03-15T10:00:00+03:00") and naive datetimes
/// (e.g. "2024-03-15T10:00:00"), which are read as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| js_error(&format!("Invalid datetime '{}'", s), e))
}

fn parse_day(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| js_error(&format!("Invalid day '{}'", s), e))
}

/// Business hours from an optional JSON object; `None` means the defaults.
fn parse_hours(json: Option<String>) -> Result<BusinessHours, JsValue> {
    match json {
        Some(json) => serde_json::from_str(&json).map_err(|e| js_error("Invalid hours JSON", e)),
        None => Ok(BusinessHours::default()),
    }
}

fn parse_bookings(json: &str) -> Result<Vec<Booking>, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error("Invalid bookings JSON", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("Serialization error", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Next date (`YYYYMMDD`) of a task starting on `date` with rule `repeat`,
/// strictly after the day `now` (`YYYYMMDD`).
#[wasm_bindgen(js_name = "nextDate")]
pub fn next_date(date: &str, repeat: &str, now: &str) -> Result<String, JsValue> {
    let now = calendar::parse_date(now).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let reference = now
        .checked_add_days(Days::new(1))
        .ok_or_else(|| JsValue::from_str("date out of range"))?;
    schedule_engine::next_date(date, repeat, reference)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Free slots on `day` (`YYYY-MM-DD`) as seen at `now`.
///
/// `bookings_json` is a JSON array of bookings; `hours_json` an optional
/// business hours object. Returns `{"day": "...", "slots": ["<RFC 3339>", ...]}`.
#[wasm_bindgen(js_name = "availableSlots")]
pub fn available_slots(
    day: &str,
    now: &str,
    bookings_json: &str,
    hours_json: Option<String>,
) -> Result<String, JsValue> {
    let day = parse_day(day)?;
    let now = parse_datetime(now)?;
    let bookings = parse_bookings(bookings_json)?;
    let hours = parse_hours(hours_json)?;

    to_json(&day_availability(&hours, day, now, &bookings))
}

/// Check whether `at` can be booked at `now`.
///
/// A rejected time is not an error: the result is
/// `{"valid": false, "reason": "..."}`. Malformed input is.
#[wasm_bindgen(js_name = "validateBooking")]
pub fn validate_booking(
    at: &str,
    now: &str,
    bookings_json: &str,
    hours_json: Option<String>,
    exclude: Option<u32>,
) -> Result<String, JsValue> {
    let at = parse_datetime(at)?;
    let now = parse_datetime(now)?;
    let bookings = parse_bookings(bookings_json)?;
    let hours = parse_hours(hours_json)?;
    let exclude = exclude.map(|id| BookingId(u64::from(id)));

    let outcome = BookingValidator::new(&hours).validate(at, exclude, &bookings, now);
    to_json(&ValidationDto {
        valid: outcome.is_ok(),
        reason: outcome.err().map(|e| e.to_string()),
    })
}

/// Mark a task done on `today` (`YYYYMMDD`).
///
/// `task_json` is a stored task (`{"date": "YYYYMMDD", "title": ..., "repeat": ...}`).
/// Returns `{"action": "remove"}` or `{"action": "reschedule", "date": "YYYYMMDD"}`.
#[wasm_bindgen(js_name = "completeTask")]
pub fn complete_task(task_json: &str, today: &str) -> Result<String, JsValue> {
    let task: Task = serde_json::from_str(task_json).map_err(|e| js_error("Invalid task JSON", e))?;
    let today = calendar::parse_date(today).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let completion = task.complete(today).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_json(&CompletionDto::from(completion))
}

/// Ticket number (`A042`, `Q007`) for a booking given as JSON.
#[wasm_bindgen(js_name = "ticketNumber")]
pub fn ticket_number(booking_json: &str) -> Result<String, JsValue> {
    let booking: Booking =
        serde_json::from_str(booking_json).map_err(|e| js_error("Invalid booking JSON", e))?;
    Ok(booking.ticket_number())
}
