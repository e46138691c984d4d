//! Cron schedule — parse once, query `next_after` repeatedly.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike,
};

use crate::error::{ScheduleError, ScheduleResult};
use crate::field::{DAY_OF_MONTH, DAY_OF_WEEK, Field, HOUR, MINUTE, MONTH};

/// How far ahead `next_after` searches before giving up.
const SEARCH_YEARS: i32 = 5;

/// A parsed five-field cron schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    expression: String,
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl Schedule {
    /// Parse a cron expression or one of the `@` descriptors.
    pub fn parse(expression: &str) -> ScheduleResult<Self> {
        let trimmed = expression.trim();
        let expanded = expand_descriptor(trimmed)
            .map_err(|reason| ScheduleError::invalid(expression, reason))?;

        let fields: Vec<&str> = expanded.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleError::invalid(
                expression,
                format!("expected 5 fields, found {}", fields.len()),
            ));
        }

        let parse = |idx: usize, spec| {
            Field::parse(fields[idx], spec).map_err(|reason| ScheduleError::invalid(expression, reason))
        };

        let schedule = Schedule {
            expression: trimmed.to_string(),
            minute: parse(0, &MINUTE)?,
            hour: parse(1, &HOUR)?,
            day_of_month: parse(2, &DAY_OF_MONTH)?,
            month: parse(3, &MONTH)?,
            day_of_week: parse(4, &DAY_OF_WEEK)?,
        };

        if !schedule.has_reachable_day() {
            return Err(ScheduleError::invalid(
                expression,
                "day-of-month never occurs in the selected months",
            ));
        }

        Ok(schedule)
    }

    /// The expression this schedule was parsed from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Nearest instant strictly after `after` that matches every field,
    /// with seconds set to zero.
    ///
    /// Local times skipped by a DST transition never fire; ambiguous local
    /// times fire at their first mapping still later than `after`. Returns
    /// `None` if nothing matches within five years.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = after.timezone();
        let start = after.naive_local();
        let limit_year = start.year() + SEARCH_YEARS;

        let mut t = start.with_second(0)?.with_nanosecond(0)? + TimeDelta::minutes(1);

        loop {
            if t.year() > limit_year {
                return None;
            }

            if !self.month.contains(t.month()) {
                t = first_of_next_month(t)?;
                continue;
            }

            if !self.day_matches(t.date()) {
                t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }

            if !self.hour.contains(t.hour()) {
                t = t.date().and_hms_opt(t.hour(), 0, 0)? + TimeDelta::hours(1);
                continue;
            }

            if !self.minute.contains(t.minute()) {
                t += TimeDelta::minutes(1);
                continue;
            }

            match tz.from_local_datetime(&t) {
                LocalResult::Single(dt) if dt > *after => return Some(dt),
                LocalResult::Ambiguous(early, late) => {
                    if early > *after {
                        return Some(early);
                    }
                    if late > *after {
                        return Some(late);
                    }
                }
                _ => {}
            }
            t += TimeDelta::minutes(1);
        }
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.day_of_month.contains(date.day());
        let dow = self
            .day_of_week
            .contains(date.weekday().num_days_from_sunday());

        if self.day_of_month.is_restricted() && self.day_of_week.is_restricted() {
            dom || dow
        } else {
            dom && dow
        }
    }

    /// Rejects expressions like `0 0 30 2 *` that can never fire.
    fn has_reachable_day(&self) -> bool {
        if self.day_of_week.is_restricted() && self.day_of_month.is_restricted() {
            return true;
        }
        self.month.values().any(|m| {
            let longest = match m {
                2 => 29,
                4 | 6 | 9 | 11 => 30,
                _ => 31,
            };
            self.day_of_month.values().any(|d| d <= longest)
        })
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Schedule::parse(s)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn expand_descriptor(expr: &str) -> Result<&str, String> {
    if !expr.starts_with('@') {
        return Ok(expr);
    }
    match expr.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => Ok("0 0 1 1 *"),
        "@monthly" => Ok("0 0 1 * *"),
        "@weekly" => Ok("0 0 * * 0"),
        "@daily" | "@midnight" => Ok("0 0 * * *"),
        "@hourly" => Ok("0 * * * *"),
        other => Err(format!("unknown descriptor {other:?}")),
    }
}

fn first_of_next_month(t: NaiveDateTime) -> Option<NaiveDateTime> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}
