//! `schedule` CLI: task recurrences and appointment slots from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Next date of a task repeating every 7 days, after 2024-01-26
//! schedule next-date --date 20240113 --repeat "d 7" --now 20240126
//!
//! # The next five last-days-of-month
//! schedule next-date --date 20240101 --repeat "m -1" --count 5
//!
//! # Free slots for a day, given opening hours and existing bookings
//! schedule slots --day 2024-03-15 --config hours.toml --bookings bookings.json
//!
//! # Can 10:00 be booked?
//! schedule validate --at 2024-03-15T10:00:00Z --bookings bookings.json
//!
//! # What happens when a repeating task is marked done
//! schedule complete --date 20240126 --repeat "w 1,3"
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` to see them.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use schedule_engine::{
    calendar, next_occurrence, Booking, BookingDesk, BookingId, BusinessHours,
    InMemoryBookingStore, RecurrenceQuery, RepetitionRule, Task, TaskCompletion,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schedule",
    version,
    about = "Task recurrence and appointment slot calculator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the next date(s) of a repeating task
    NextDate {
        /// Task start date (YYYYMMDD)
        #[arg(long)]
        date: String,
        /// Repeat rule, e.g. "y", "d 7", "w 1,3", "m -1 2"
        #[arg(long)]
        repeat: String,
        /// Dates are computed strictly after this day (YYYYMMDD, defaults to today)
        #[arg(long)]
        now: Option<String>,
        /// How many dates to print
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// List the free appointment slots of a day as JSON
    Slots {
        /// Calendar day in the shop's time zone (YYYY-MM-DD)
        #[arg(long)]
        day: NaiveDate,
        #[command(flatten)]
        shop: ShopArgs,
    },
    /// Check whether a time can be booked
    Validate {
        /// Requested appointment time (RFC 3339)
        #[arg(long)]
        at: DateTime<Utc>,
        /// Booking being moved; its own slot does not count as taken
        #[arg(long)]
        exclude: Option<BookingId>,
        #[command(flatten)]
        shop: ShopArgs,
    },
    /// Show what marking a task done does: remove it, or move it to a new date
    Complete {
        /// Current task date (YYYYMMDD)
        #[arg(long)]
        date: String,
        /// Repeat rule; empty for a one-off task
        #[arg(long, default_value = "")]
        repeat: String,
        /// Day the task is marked done (YYYYMMDD, defaults to today)
        #[arg(long)]
        today: Option<String>,
    },
}

/// Options shared by the booking commands.
#[derive(Args)]
struct ShopArgs {
    /// Current time (RFC 3339, defaults to the system clock)
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Business hours TOML file (defaults: 09:00-18:00, 30 minute slots, UTC)
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON array of existing bookings
    #[arg(long)]
    bookings: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::NextDate {
            date,
            repeat,
            now,
            count,
        } => {
            let today = parse_day_or_today(now.as_deref())?;
            for date in next_dates(&date, &repeat, today, count)? {
                println!("{}", calendar::format_date(date));
            }
        }
        Commands::Slots { day, shop } => {
            let now = shop.now.unwrap_or_else(Utc::now);
            let desk = open_desk(&shop)?;
            let availability = desk
                .available_slots(day, now)
                .context("Failed to compute available slots")?;
            println!("{}", serde_json::to_string_pretty(&availability)?);
        }
        Commands::Validate { at, exclude, shop } => {
            let now = shop.now.unwrap_or_else(Utc::now);
            let desk = open_desk(&shop)?;
            match desk.validate(at, exclude, now) {
                Ok(()) => println!("ok"),
                Err(e) if e.is_booking_rejection() => {
                    println!("rejected: {}", e);
                    process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to validate booking"),
            }
        }
        Commands::Complete {
            date,
            repeat,
            today,
        } => {
            let today = parse_day_or_today(today.as_deref())?;
            let task = Task {
                id: None,
                date: calendar::parse_date(&date)?,
                title: String::new(),
                comment: String::new(),
                repeat: parse_repeat(&repeat)?,
            };
            match task.complete(today)? {
                TaskCompletion::Remove => println!("remove"),
                TaskCompletion::Reschedule(next) => println!("{}", calendar::format_date(next)),
            }
        }
    }

    Ok(())
}

/// The first `count` occurrences strictly after `today`.
fn next_dates(date: &str, repeat: &str, today: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    let start = calendar::parse_date(date)?;
    let rule = RepetitionRule::parse(repeat)?;
    let mut query = RecurrenceQuery::new(start, rule, next_day(today)?);

    let mut dates = Vec::with_capacity(count);
    while dates.len() < count {
        let next = next_occurrence(&query)?;
        dates.push(next);
        query.reference = next_day(next)?;
    }
    Ok(dates)
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .with_context(|| format!("No day after {}", date))
}

fn parse_day_or_today(day: Option<&str>) -> Result<NaiveDate> {
    match day {
        Some(day) => Ok(calendar::parse_date(day)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_repeat(repeat: &str) -> Result<Option<RepetitionRule>> {
    if repeat.is_empty() {
        return Ok(None);
    }
    Ok(Some(RepetitionRule::parse(repeat)?))
}

fn open_desk(shop: &ShopArgs) -> Result<BookingDesk<InMemoryBookingStore>> {
    let hours = match &shop.config {
        Some(path) => load_hours(path)?,
        None => BusinessHours::default(),
    };
    let bookings = match &shop.bookings {
        Some(path) => load_bookings(path)?,
        None => Vec::new(),
    };
    debug!(
        open = %hours.open(),
        close = %hours.close(),
        timezone = %hours.timezone(),
        bookings = bookings.len(),
        "loaded shop state"
    );
    Ok(BookingDesk::new(
        hours,
        InMemoryBookingStore::with_bookings(bookings),
    ))
}

fn load_hours(path: &Path) -> Result<BusinessHours> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Invalid business hours in {}", path.display()))
}

fn load_bookings(path: &Path) -> Result<Vec<Booking>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid bookings in {}", path.display()))
}
