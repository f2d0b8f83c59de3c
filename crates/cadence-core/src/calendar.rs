//! Pure day-boundary arithmetic and view grids.
//!
//! Grids are Monday-aligned for display. Recurrence week arithmetic uses
//! [`sunday_week_start`] instead, independently of how grids are laid out.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MS_PER_DAY: i64 = 86_400_000;

/// Truncate an instant to local midnight.
pub fn day_start(instant: NaiveDateTime) -> NaiveDateTime {
    instant.date().and_time(NaiveTime::MIN)
}

pub fn monday_week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_monday()))
}

pub fn sunday_week_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_sunday()))
}

/// Months since year 0, so month differences are plain subtraction.
pub fn month_ordinal(day: NaiveDate) -> i64 {
    i64::from(day.year()) * 12 + i64::from(day.month0())
}

/// Number of days in the month identified by a [`month_ordinal`].
pub fn days_in_month(ordinal: i64) -> u32 {
    let year = ordinal.div_euclid(12);
    let month = ordinal.rem_euclid(12) + 1;
    match month {
        2 => {
            let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
            if leap {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// The date with day-of-month `day` in the month identified by `ordinal`,
/// or `None` if that month is too short.
pub fn date_in_month(ordinal: i64, day: u32) -> Option<NaiveDate> {
    let year = i32::try_from(ordinal.div_euclid(12)).ok()?;
    let month = u32::try_from(ordinal.rem_euclid(12) + 1).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewType {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "3days")]
    ThreeDays,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "month")]
    Month,
}

impl ViewType {
    fn label(&self) -> &'static str {
        match self {
            ViewType::Day => "day",
            ViewType::ThreeDays => "3days",
            ViewType::Week => "week",
            ViewType::TwoWeeks => "2weeks",
            ViewType::Month => "month",
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid view type: {0}")]
pub struct ParseViewTypeError(String);

impl FromStr for ViewType {
    type Err = ParseViewTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(ViewType::Day),
            "3days" | "three-days" => Ok(ViewType::ThreeDays),
            "week" => Ok(ViewType::Week),
            "2weeks" | "two-weeks" => Ok(ViewType::TwoWeeks),
            "month" => Ok(ViewType::Month),
            _ => Err(ParseViewTypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Ordered days a view displays for `anchor`.
pub fn grid_days(anchor: NaiveDate, view: ViewType) -> Vec<NaiveDate> {
    let (first, len) = match view {
        ViewType::Day => (anchor, 1),
        ViewType::ThreeDays => (anchor, 3),
        ViewType::Week => (monday_week_start(anchor), 7),
        ViewType::TwoWeeks => (monday_week_start(anchor), 14),
        ViewType::Month => {
            let first_of_month = anchor.with_day(1).unwrap_or(anchor);
            (monday_week_start(first_of_month), 42)
        }
    };
    first.iter_days().take(len).collect()
}

/// Move the view anchor by one natural unit of the view.
pub fn step_date(date: NaiveDate, view: ViewType, direction: Direction) -> NaiveDate {
    let stepped = match (view, direction) {
        (ViewType::Month, Direction::Forward) => date.checked_add_months(Months::new(1)),
        (ViewType::Month, Direction::Backward) => date.checked_sub_months(Months::new(1)),
        (_, Direction::Forward) => date.checked_add_days(Days::new(step_days(view))),
        (_, Direction::Backward) => date.checked_sub_days(Days::new(step_days(view))),
    };
    stepped.unwrap_or(date)
}

fn step_days(view: ViewType) -> u64 {
    match view {
        ViewType::Day => 1,
        ViewType::ThreeDays => 3,
        ViewType::Week => 7,
        ViewType::TwoWeeks => 14,
        ViewType::Month => 0,
    }
}
