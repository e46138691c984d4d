//! avalio-schedule — cron expressions for monitor timing.
//!
//! A [`Schedule`] is parsed once from a five-field expression
//! (`minute hour day-of-month month day-of-week`) and then queried for the
//! next instant after a given time:
//!
//! ```text
//! "*/5 * * * *"   every five minutes
//! "0 9 * * mon"   09:00 every Monday
//! "0 0 13 * 5"    midnight on the 13th and on every Friday
//! "@hourly"       "0 * * * *"
//! ```
//!
//! When both day fields are restricted, a day matches if *either* matches
//! (vixie-cron behavior). Otherwise both must match.

pub mod error;
mod field;
pub mod schedule;

pub use error::{ScheduleError, ScheduleResult};
pub use schedule::Schedule;
