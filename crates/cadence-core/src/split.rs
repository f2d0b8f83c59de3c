use chrono::{Days, NaiveDate};
use log::debug;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::models::{
    EditScope, EndCondition, EntryChanges, EntryStatus, RecurrencePattern, ScheduleEntry,
};
use crate::recurrence::{EngineConfig, RecurrenceEngine};

/// Entries a split produces. The store must persist all parts together:
/// `head` replaces the original, `body` and `tail` are new entries, and
/// `removed` names an entry to delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOutcome {
    pub head: Option<ScheduleEntry>,
    pub body: Option<ScheduleEntry>,
    pub tail: Option<ScheduleEntry>,
    pub removed: Option<Uuid>,
}

impl SplitOutcome {
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.body.is_none() && self.tail.is_none() && self.removed.is_none()
    }
}

/// What happens to the targeted occurrences
#[derive(Debug, Clone, PartialEq)]
pub enum SplitAction {
    Edit(EntryChanges),
    Delete,
}

/// SeriesSplitter: decomposes a recurring entry around one occurrence.
///
/// Every day other than the split day keeps its occurrence status across
/// `head` and `tail`, except the days a delete explicitly removes.
#[derive(Debug, Clone, Default)]
pub struct SeriesSplitter {
    config: EngineConfig,
}

impl SeriesSplitter {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Applies `action` to the occurrences of `original` selected by `scope`,
    /// with `split_day` naming the occurrence the user picked.
    ///
    /// # Errors
    /// * `InvalidInstance` - `original` does not repeat, or `split_day` is not
    ///   one of its occurrences (not checked for `EntireSeries`)
    /// * `InvalidPattern` - the pattern of `original` or of the edit is malformed
    pub fn split(
        &self,
        original: &ScheduleEntry,
        split_day: NaiveDate,
        scope: EditScope,
        action: &SplitAction,
    ) -> Result<SplitOutcome, ScheduleError> {
        let engine = RecurrenceEngine::for_entry(original, self.config)?;
        if scope != EditScope::EntireSeries && !engine.occurs_on(split_day) {
            return Err(ScheduleError::InvalidInstance(format!(
                "{} is not an occurrence of entry {}",
                split_day, original.id
            )));
        }
        if let SplitAction::Edit(EntryChanges {
            recurrence: Some(Some(pattern)),
            ..
        }) = action
        {
            pattern.validate()?;
        }

        debug!(
            "Splitting entry {} at {} (scope: {}, action: {:?})",
            original.id, split_day, scope, action
        );

        let outcome = match (scope, action) {
            (EditScope::ThisOccurrence, SplitAction::Edit(changes)) => SplitOutcome {
                head: Some(excluding_day(original, split_day)),
                body: Some(detach_occurrence(original, split_day, changes)),
                ..Default::default()
            },
            (EditScope::ThisOccurrence, SplitAction::Delete) => SplitOutcome {
                head: Some(excluding_day(original, split_day)),
                ..Default::default()
            },
            (EditScope::ThisAndFuture, SplitAction::Edit(changes)) => {
                let index = engine.occurrence_index(split_day).ok_or_else(|| {
                    ScheduleError::InvalidInstance(format!("{} has no index", split_day))
                })?;
                let mut outcome = truncate_before(original, split_day, engine.anchor_day());
                outcome.tail = Some(continue_from(original, split_day, index, changes));
                outcome
            }
            (EditScope::ThisAndFuture, SplitAction::Delete) => {
                truncate_before(original, split_day, engine.anchor_day())
            }
            (EditScope::EntireSeries, SplitAction::Edit(changes)) => {
                let mut head = original.clone();
                head.apply_changes(changes);
                if let Some(recurrence) = &changes.recurrence {
                    head.recurrence = recurrence
                        .as_ref()
                        .map(|new| carry_marks(new, original.recurrence.as_ref()));
                }
                SplitOutcome {
                    head: Some(head),
                    ..Default::default()
                }
            }
            (EditScope::EntireSeries, SplitAction::Delete) => SplitOutcome {
                removed: Some(original.id),
                ..Default::default()
            },
        };
        Ok(outcome)
    }

    pub fn edit(
        &self,
        original: &ScheduleEntry,
        split_day: NaiveDate,
        scope: EditScope,
        changes: EntryChanges,
    ) -> Result<SplitOutcome, ScheduleError> {
        self.split(original, split_day, scope, &SplitAction::Edit(changes))
    }

    pub fn delete(
        &self,
        original: &ScheduleEntry,
        split_day: NaiveDate,
        scope: EditScope,
    ) -> Result<SplitOutcome, ScheduleError> {
        self.split(original, split_day, scope, &SplitAction::Delete)
    }
}

fn excluding_day(original: &ScheduleEntry, day: NaiveDate) -> ScheduleEntry {
    let mut head = original.clone();
    if let Some(pattern) = head.recurrence.as_mut() {
        pattern.exclude_dates.insert(day);
    }
    head
}

/// Standalone copy of the occurrence on `day`, without recurrence.
fn detach_occurrence(original: &ScheduleEntry, day: NaiveDate, changes: &EntryChanges) -> ScheduleEntry {
    let completed = original
        .recurrence
        .as_ref()
        .is_some_and(|pattern| pattern.is_complete(day));

    let mut body = original.fork();
    body.scheduled_at = day.and_time(original.time_of_day());
    body.recurrence = None;
    if completed {
        body.status = EntryStatus::Completed;
    }
    body.apply_changes(changes);
    body
}

/// Head that stops the day before `split_day`. When nothing would remain the
/// original is removed instead.
fn truncate_before(original: &ScheduleEntry, split_day: NaiveDate, anchor_day: NaiveDate) -> SplitOutcome {
    let last_day = match split_day.checked_sub_days(Days::new(1)) {
        Some(day) if split_day > anchor_day => day,
        _ => {
            return SplitOutcome {
                removed: Some(original.id),
                ..Default::default()
            }
        }
    };

    let mut head = original.clone();
    if let Some(pattern) = head.recurrence.as_mut() {
        pattern.end = EndCondition::Until(last_day);
        pattern.exclude_dates.retain(|day| *day < split_day);
        pattern.completed_instances.retain(|day| *day < split_day);
    }
    SplitOutcome {
        head: Some(head),
        ..Default::default()
    }
}

/// New series starting at `split_day` carrying the remaining occurrences.
fn continue_from(
    original: &ScheduleEntry,
    split_day: NaiveDate,
    split_index: u32,
    changes: &EntryChanges,
) -> ScheduleEntry {
    let mut tail = original.fork();
    tail.scheduled_at = split_day.and_time(original.time_of_day());
    let remaining = original
        .recurrence
        .as_ref()
        .map(|pattern| remaining_pattern(pattern, split_day, split_index));
    tail.apply_changes(changes);
    tail.recurrence = match &changes.recurrence {
        Some(recurrence) => recurrence
            .as_ref()
            .map(|new| carry_marks(new, remaining.as_ref())),
        None => remaining,
    };
    tail
}

/// `new` with the completion marks and exclusions of `previous` added back.
/// Marks the new rule no longer generates are kept as stale entries.
fn carry_marks(new: &RecurrencePattern, previous: Option<&RecurrencePattern>) -> RecurrencePattern {
    let mut pattern = new.clone();
    if let Some(previous) = previous {
        pattern
            .completed_instances
            .extend(previous.completed_instances.iter().copied());
        pattern.exclude_dates.extend(previous.exclude_dates.iter().copied());
    }
    pattern
}

fn remaining_pattern(pattern: &RecurrencePattern, split_day: NaiveDate, split_index: u32) -> RecurrencePattern {
    let mut remaining = pattern.clone();
    if let EndCondition::AfterOccurrences(total) = pattern.end {
        remaining.end = EndCondition::AfterOccurrences(total.saturating_sub(split_index - 1).max(1));
    }
    remaining.exclude_dates.retain(|day| *day >= split_day);
    remaining.completed_instances.retain(|day| *day >= split_day);
    remaining
}
