//! Per-instance completion of recurring entries.
//!
//! Checking off an occurrence records its day-key on the pattern. The series
//! itself stays `Pending`; only one-off entries flip their status.

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;

use crate::error::ScheduleError;
use crate::models::{EntryStatus, RecurrencePattern, ScheduleEntry};
use crate::recurrence::{EngineConfig, RecurrenceEngine};

impl RecurrencePattern {
    /// Returns `true` if the day was not already marked
    pub fn mark_complete(&mut self, day: NaiveDate) -> bool {
        self.completed_instances.insert(day)
    }

    /// Returns `true` if the day was marked
    pub fn mark_incomplete(&mut self, day: NaiveDate) -> bool {
        self.completed_instances.remove(&day)
    }

    pub fn is_complete(&self, day: NaiveDate) -> bool {
        self.completed_instances.contains(&day)
    }
}

/// What a toggle changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// An occurrence of a recurring entry was checked or unchecked
    Instance { day: NaiveDate, completed: bool },
    /// A one-off entry moved to this status
    Status(EntryStatus),
}

/// Toggles the occurrence of `entry` that is relevant on `today`: the latest
/// one on or before it. One-off entries toggle between pending and completed.
///
/// # Errors
/// * `InvalidInstance` - the series has no occurrence on or before `today`
/// * `IterationLimitExceeded` - resolving the current occurrence hit the cap
pub fn toggle_current_instance(
    entry: &mut ScheduleEntry,
    today: NaiveDate,
    config: EngineConfig,
) -> Result<ToggleOutcome, ScheduleError> {
    if !entry.is_recurring() {
        entry.status = match entry.status {
            EntryStatus::Completed => EntryStatus::Pending,
            _ => EntryStatus::Completed,
        };
        return Ok(ToggleOutcome::Status(entry.status));
    }

    let current = RecurrenceEngine::for_entry(entry, config)?.current_instance_on_or_before(today)?;
    let day = current.ok_or_else(|| {
        ScheduleError::InvalidInstance(format!(
            "entry {} has no occurrence on or before {}",
            entry.id, today
        ))
    })?;
    toggle_instance(entry, day, config)
}

/// Toggles the completion mark of the occurrence on `day`.
///
/// # Errors
/// * `InvalidInstance` - the entry does not repeat or `day` is not one of its
///   occurrences
pub fn toggle_instance(
    entry: &mut ScheduleEntry,
    day: NaiveDate,
    config: EngineConfig,
) -> Result<ToggleOutcome, ScheduleError> {
    if !RecurrenceEngine::for_entry(entry, config)?.occurs_on(day) {
        return Err(ScheduleError::InvalidInstance(format!(
            "{} is not an occurrence of entry {}",
            day, entry.id
        )));
    }
    let pattern = entry.recurrence.as_mut().ok_or_else(|| {
        ScheduleError::InvalidInstance(format!("entry {} is not recurring", entry.id))
    })?;

    let completed = if pattern.is_complete(day) {
        pattern.mark_incomplete(day);
        false
    } else {
        pattern.mark_complete(day)
    };
    debug!(
        "Toggled occurrence {} of entry {} (completed: {})",
        day, entry.id, completed
    );
    Ok(ToggleOutcome::Instance { day, completed })
}

/// Whether `entry` has work that ended before `now` without being completed.
///
/// For a series only the current occurrence counts; missing an older one does
/// not keep the series overdue forever.
pub fn is_overdue(
    entry: &ScheduleEntry,
    now: NaiveDateTime,
    config: EngineConfig,
) -> Result<bool, ScheduleError> {
    if entry.status != EntryStatus::Pending {
        return Ok(false);
    }
    let Some(pattern) = &entry.recurrence else {
        return Ok(entry.scheduled_at + entry.duration() < now);
    };

    let engine = RecurrenceEngine::for_entry(entry, config)?;
    match engine.current_instance_on_or_before(now.date())? {
        Some(day) if !pattern.is_complete(day) => {
            Ok(engine.instant_on(day) + entry.duration() < now)
        }
        _ => Ok(false),
    }
}
