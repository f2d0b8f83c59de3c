use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ScheduleError;
use crate::models::{EntryStatus, ScheduleEntry};
use crate::recurrence::{EngineConfig, RecurrenceEngine};

/// One entry placed on one displayed day.
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaItem<'a> {
    pub entry: &'a ScheduleEntry,
    pub day: NaiveDate,
    /// When this occurrence started, possibly on an earlier day
    pub starts_at: NaiveDateTime,
    /// The occurrence began before `day` and runs into it
    pub is_spillover: bool,
    pub completed: bool,
}

impl AgendaItem<'_> {
    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at + self.entry.duration()
    }
}

/// Expands `entries` into the items shown on each of `days`.
///
/// Items come out grouped by day in the order of `days`; within a day all-day
/// entries come first, then by start time. Cancelled entries are skipped.
pub fn agenda<'a>(
    entries: &'a [ScheduleEntry],
    days: &[NaiveDate],
    config: EngineConfig,
) -> Result<Vec<AgendaItem<'a>>, ScheduleError> {
    let mut items = Vec::new();
    for &day in days {
        let mut today = Vec::new();
        for entry in entries {
            if entry.status == EntryStatus::Cancelled {
                continue;
            }
            today.extend(place(entry, day, config)?);
        }
        today.sort_by_key(|item| (!item.entry.is_all_day, item.starts_at));
        items.extend(today);
    }
    Ok(items)
}

/// Every item `entry` contributes to `day`. A recurring entry can contribute
/// two: last night's occurrence running into the morning and the one that
/// starts on `day`.
fn place(
    entry: &ScheduleEntry,
    day: NaiveDate,
    config: EngineConfig,
) -> Result<Vec<AgendaItem<'_>>, ScheduleError> {
    let placed: Vec<(NaiveDateTime, bool)> = match &entry.recurrence {
        Some(pattern) => {
            let engine = RecurrenceEngine::for_entry(entry, config)?;
            engine
                .occurrences_covering(day, entry.duration())
                .into_iter()
                .map(|start| (start, pattern.is_complete(start.date())))
                .collect()
        }
        None => {
            let start = entry.scheduled_at;
            let covers = start.date() == day
                || (start.date() < day && start + entry.duration() > day.and_time(NaiveTime::MIN));
            if covers {
                vec![(start, entry.status == EntryStatus::Completed)]
            } else {
                Vec::new()
            }
        }
    };

    Ok(placed
        .into_iter()
        .map(|(starts_at, completed)| AgendaItem {
            entry,
            day,
            starts_at,
            is_spillover: starts_at.date() != day,
            completed,
        })
        .collect())
}
