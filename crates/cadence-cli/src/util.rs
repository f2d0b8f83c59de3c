use anyhow::{anyhow, Result};
use cadence_core::error::ScheduleError;
use cadence_core::models::{EndCondition, RecurrencePattern};
use cadence_core::store::ScheduleStore;
use chrono::{Datelike, NaiveDate, Weekday};
use uuid::Uuid;

use crate::cli::{RecurrenceArgs, RecurrenceShortcut};
use crate::parser::{parse_day, parse_weekdays};

pub async fn resolve_entry_id(store: &impl ScheduleStore, short_id: &str) -> Result<Uuid> {
    if short_id.len() < 2 {
        return Err(anyhow!(ScheduleError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let entries = store.find_entries_by_short_id(short_id).await?;
    if entries.len() == 1 {
        Ok(entries[0].id)
    } else if entries.is_empty() {
        Err(anyhow!(ScheduleError::NotFound(format!(
            "No entry found with ID '{}'",
            short_id
        ))))
    } else {
        let matches: Vec<(String, String)> = entries
            .into_iter()
            .map(|e| (e.id.to_string(), e.title))
            .collect();
        Err(anyhow!(ScheduleError::AmbiguousId(matches)))
    }
}

/// Builds the pattern described by the recurrence flags, or `None` when
/// `--every` was not given. Weekly rules without `--on` repeat on the
/// weekday of `anchor_day`.
pub fn build_pattern(
    args: &RecurrenceArgs,
    anchor_day: NaiveDate,
    today: NaiveDate,
) -> Result<Option<RecurrencePattern>> {
    let Some(every) = args.every else {
        return Ok(None);
    };
    let interval = args.interval.unwrap_or(1);
    let explicit_days = args.on.as_deref().map(parse_weekdays).transpose()?;

    let mut pattern = match every {
        RecurrenceShortcut::Daily => RecurrencePattern::daily(interval),
        RecurrenceShortcut::Monthly => RecurrencePattern::monthly(interval),
        RecurrenceShortcut::Weekly => RecurrencePattern::weekly(
            interval,
            explicit_days.unwrap_or_else(|| vec![anchor_day.weekday()]),
        ),
        RecurrenceShortcut::Weekdays => RecurrencePattern::weekly(
            interval,
            [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        ),
        RecurrenceShortcut::Weekends => {
            RecurrencePattern::weekly(interval, [Weekday::Sat, Weekday::Sun])
        }
    };

    if let Some(count) = args.count {
        pattern = pattern.with_end(EndCondition::AfterOccurrences(count));
    } else if let Some(until) = &args.until {
        pattern = pattern.with_end(EndCondition::Until(parse_day(until, today)?));
    }
    pattern.validate()?;
    Ok(Some(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_defaults_to_anchor_weekday() {
        let args = RecurrenceArgs {
            every: Some(RecurrenceShortcut::Weekly),
            ..Default::default()
        };
        // 2025-01-15 is a Wednesday
        let pattern = build_pattern(&args, date(2025, 1, 15), date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(pattern, RecurrencePattern::weekly(1, [Weekday::Wed]));
    }

    #[test]
    fn test_end_conditions() {
        let args = RecurrenceArgs {
            every: Some(RecurrenceShortcut::Daily),
            interval: Some(2),
            until: Some("2025-03-01".to_string()),
            ..Default::default()
        };
        let pattern = build_pattern(&args, date(2025, 1, 1), date(2025, 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(pattern.interval, 2);
        assert_eq!(pattern.end, EndCondition::Until(date(2025, 3, 1)));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let args = RecurrenceArgs {
            every: Some(RecurrenceShortcut::Daily),
            interval: Some(0),
            ..Default::default()
        };
        assert!(build_pattern(&args, date(2025, 1, 1), date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_no_shortcut_means_no_pattern() {
        let args = RecurrenceArgs::default();
        assert!(build_pattern(&args, date(2025, 1, 1), date(2025, 1, 1))
            .unwrap()
            .is_none());
    }
}
