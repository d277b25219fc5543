//! Cron schedules evaluated in a local timezone.
//!
//! Accepts "MIN HOUR DOM MON DOW" (5-field, no seconds). Each field takes
//! `*`, `*/N`, `N`, `A-B`, `A-B/N` and comma lists. Day-of-week is 0-6 with
//! Sunday = 0 (7 is also Sunday). Example: "0 9 * * 1-5" = weekdays at 9:00.
//!
//! Matching is done by [`cron::Schedule`] on wall-clock time; this module
//! owns the 5-field dialect and the mapping of wall-clock times to instants.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, Result};

/// How far ahead `next_after` searches before giving up.
const SEARCH_HORIZON_DAYS: i64 = 366 * 4;

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A parsed cron expression.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    /// One schedule, or two when DOM and DOW are both restricted (either may match).
    schedules: Vec<cron::Schedule>,
}

impl CronSchedule {
    /// Parse a 5-field cron expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(AppError::schedule(format!(
                "Invalid cron expression '{expression}' (need 5 fields: MIN HOUR DOM MON DOW)"
            )));
        }

        let field = |idx: usize, min: u32, max: u32| {
            parse_field(parts[idx], min, max).ok_or_else(|| {
                AppError::schedule(format!(
                    "Invalid field '{}' in cron expression '{}'",
                    parts[idx], expression
                ))
            })
        };

        let minutes = field(0, 0, 59)?;
        let hours = field(1, 0, 23)?;
        let days_of_month = field(2, 1, 31)?;
        let months = field(3, 1, 12)?;
        let days_of_week = field(4, 0, 7)?;

        let minute = restricted(parts[0], join(&minutes));
        let hour = restricted(parts[1], join(&hours));
        let dom = restricted(parts[2], join(&days_of_month));
        let month = restricted(parts[3], join(&months));
        let dow = restricted(parts[4], weekday_list(&days_of_week));

        // Classic cron: when both day fields are restricted, either may match.
        let either_day = !parts[2].starts_with('*') && !parts[4].starts_with('*');
        let variants = if either_day {
            vec![(dom, "*".to_string()), ("*".to_string(), dow)]
        } else {
            vec![(dom, dow)]
        };

        let schedules = variants
            .into_iter()
            .map(|(dom, dow)| {
                let source = format!("0 {minute} {hour} {dom} {month} {dow}");
                cron::Schedule::from_str(&source).map_err(|e| {
                    AppError::schedule(format!("Invalid cron expression '{expression}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            expression: expression.trim().to_string(),
            schedules,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next matching minute strictly after `after`, evaluated in `tz`.
    ///
    /// Local times skipped by a DST transition never match. A repeated local
    /// time resolves to its earlier instant unless that is not after `after`.
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        // Wall-clock time carried as UTC so the schedule sees no offsets.
        let wall = Utc.from_utc_datetime(&after.with_timezone(&tz).naive_local());
        let limit = wall + Duration::days(SEARCH_HORIZON_DAYS);

        self.schedules
            .iter()
            .filter_map(|schedule| {
                schedule
                    .after(&wall)
                    .take_while(|candidate| *candidate < limit)
                    .find_map(|candidate| resolve_local(candidate.naive_utc(), tz, after))
            })
            .min()
    }
}

/// First instant for local time `local` in `tz` that is strictly after `after`.
fn resolve_local(local: NaiveDateTime, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let resolved = tz.from_local_datetime(&local);
    [resolved.earliest(), resolved.latest()]
        .into_iter()
        .flatten()
        .map(|instant| instant.with_timezone(&Utc))
        .find(|instant| *instant > after)
}

/// Resolve an IANA timezone name, defaulting to UTC.
pub fn parse_timezone(name: Option<&str>) -> Result<Tz> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(Tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|e| AppError::schedule(format!("Unknown timezone '{name}': {e}"))),
    }
}

/// Parse a cron field into a sorted list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let mut values = Vec::new();

    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, step.parse::<u32>().ok()?),
            None => (part, 1),
        };
        if step == 0 {
            return None;
        }

        let (start, end) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            (a.parse().ok()?, b.parse().ok()?)
        } else {
            let n: u32 = range.parse().ok()?;
            // "N/step" runs from N to the end of the range
            if part.contains('/') { (n, max) } else { (n, n) }
        };

        if start < min || end > max || start > end {
            return None;
        }
        values.extend((start..=end).step_by(step as usize));
    }

    values.sort_unstable();
    values.dedup();
    Some(values)
}

/// `*` stays `*`; anything else becomes its explicit value list.
fn restricted(raw: &str, list: String) -> String {
    if raw == "*" { raw.to_string() } else { list }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Day-of-week values (0-7, both ends Sunday) as weekday names.
fn weekday_list(values: &[u32]) -> String {
    let mut days: Vec<u32> = values.iter().map(|d| d % 7).collect();
    days.sort_unstable();
    days.dedup();
    days.iter()
        .map(|d| WEEKDAY_NAMES[*d as usize])
        .collect::<Vec<_>>()
        .join(",")
}
