use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_english::{parse_date_string, Dialect};
use std::str::FromStr;

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%I:%M %p", "%I:%M%p"];

/// Parses a wall-clock instant. ISO forms are tried first, then natural
/// language ("tomorrow 9am", "next friday") relative to `now`.
///
/// A bare date resolves to local midnight.
pub fn parse_when(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(instant);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }
    // chrono-english works on zoned instants; treating local wall-clock time
    // as UTC keeps the arithmetic in local time.
    parse_date_string(input, now.and_utc(), Dialect::Uk)
        .map(|instant| instant.naive_utc())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    Ok(parse_when(input, today.and_time(NaiveTime::MIN))?.date())
}

pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    let upper = input.to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&upper, format).ok())
        .ok_or_else(|| anyhow!("Failed to parse time '{}'", input))
}

/// Comma-separated weekday names, e.g. "mon,wed,fri"
pub fn parse_weekdays(input: &str) -> Result<Vec<Weekday>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Weekday::from_str(part).map_err(|_| anyhow!("Unknown weekday '{}'", part)))
        .collect()
}
