use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ScheduleError;
use crate::models::ScheduleEntry;
use crate::recurrence::{EngineConfig, RecurrenceEngine};

/// Habit statistics for one series over a day range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    pub total_occurrences: usize,
    pub completed: usize,
    /// `completed / total_occurrences`, 0.0 for an empty range
    pub completion_rate: f64,
    /// Completed occurrences in a row ending at the last occurrence in range
    pub current_streak: usize,
    pub longest_streak: usize,
}

/// Walks the occurrences of `entry` in `start..=end` and summarises which
/// ones were checked off. Excluded days do not count, in either direction.
///
/// # Errors
/// * `InvalidInstance` - the entry does not repeat
/// * `IterationLimitExceeded` - the range is too large for the configured cap
pub fn series_statistics(
    entry: &ScheduleEntry,
    start: NaiveDate,
    end: NaiveDate,
    config: EngineConfig,
) -> Result<SeriesStatistics, ScheduleError> {
    let engine = RecurrenceEngine::for_entry(entry, config)?;
    let pattern = engine.pattern();

    let mut total_occurrences = 0;
    let mut completed = 0;
    let mut run = 0;
    let mut longest_streak = 0;
    for occurrence in engine.occurrences_between(start, end) {
        let day = occurrence?;
        total_occurrences += 1;
        if pattern.is_complete(day) {
            completed += 1;
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 0;
        }
    }

    let completion_rate = if total_occurrences == 0 {
        0.0
    } else {
        completed as f64 / total_occurrences as f64
    };

    Ok(SeriesStatistics {
        total_occurrences,
        completed,
        completion_rate,
        current_streak: run,
        longest_streak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecurrencePattern;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(done: &[u32]) -> ScheduleEntry {
        let mut pattern = RecurrencePattern::daily(1).excluding([date(2024, 1, 4)]);
        for day in done {
            pattern.mark_complete(date(2024, 1, *day));
        }
        ScheduleEntry::task("Meditate", date(2024, 1, 1).and_hms_opt(7, 0, 0).unwrap())
            .recurring(pattern)
    }

    #[test]
    fn test_streaks_skip_excluded_days() {
        // Jan 4 is excluded, so 3 -> 5 is still a streak
        let entry = habit(&[1, 3, 5, 6, 8, 9]);
        let stats =
            series_statistics(&entry, date(2024, 1, 1), date(2024, 1, 9), EngineConfig::default())
                .unwrap();
        assert_eq!(stats.total_occurrences, 8);
        assert_eq!(stats.completed, 6);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.current_streak, 2);
        assert!((stats.completion_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unfinished_last_occurrence_resets_current_streak() {
        let entry = habit(&[1, 2, 3]);
        let stats =
            series_statistics(&entry, date(2024, 1, 1), date(2024, 1, 5), EngineConfig::default())
                .unwrap();
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn test_empty_range() {
        let entry = habit(&[]);
        let stats =
            series_statistics(&entry, date(2023, 1, 1), date(2023, 12, 31), EngineConfig::default())
                .unwrap();
        assert_eq!(stats.total_occurrences, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn test_one_off_entries_have_no_statistics() {
        let entry = ScheduleEntry::task("Once", date(2024, 1, 1).and_hms_opt(7, 0, 0).unwrap());
        assert!(matches!(
            series_statistics(&entry, date(2024, 1, 1), date(2024, 1, 2), EngineConfig::default()),
            Err(ScheduleError::InvalidInstance(_))
        ));
    }
}
