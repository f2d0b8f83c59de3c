use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ScheduleError;

/// Wall-clock time all-day entries are pinned to, clear of DST transitions.
pub fn all_day_anchor_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Task,
    TimeBlock,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Task => write!(f, "task"),
            EntryKind::TimeBlock => write!(f, "timeblock"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid entry status: {0}")]
pub struct ParseEntryStatusError(String);

impl FromStr for EntryStatus {
    type Err = ParseEntryStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EntryStatus::Pending),
            "completed" | "done" => Ok(EntryStatus::Completed),
            "cancelled" => Ok(EntryStatus::Cancelled),
            _ => Err(ParseEntryStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "pending"),
            EntryStatus::Completed => write!(f, "completed"),
            EntryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ============================================================================
// Recurrence Pattern
// ============================================================================

/// Set of weekdays, stored as a bitmask indexed from Sunday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, day: Weekday) -> bool {
        let bit = Self::bit(day);
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in calendar order, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        SUNDAY_FIRST
            .iter()
            .copied()
            .filter(move |day| self.contains(*day))
    }

    /// Number of members whose Sunday-based position lies in `from..=to`.
    pub fn count_between(&self, from: u32, to: u32) -> usize {
        self.iter()
            .map(|day| day.num_days_from_sunday())
            .filter(|pos| *pos >= from && *pos <= to)
            .count()
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// How often a series repeats. The weekday set only exists for weekly rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly { days: WeekdaySet },
    Monthly,
}

impl Frequency {
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly { .. } => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

/// When a series stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    Never,
    /// Total number of occurrences, the first included.
    AfterOccurrences(u32),
    /// Last day (inclusive) that may hold an occurrence.
    Until(NaiveDate),
}

/// A repeating rule owned by exactly one [`ScheduleEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: u32,
    pub end: EndCondition,
    /// Days skipped even when the rule would otherwise fire
    pub exclude_dates: BTreeSet<NaiveDate>,
    /// Days the user checked off; never touches the entry's status
    pub completed_instances: BTreeSet<NaiveDate>,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            end: EndCondition::Never,
            exclude_dates: BTreeSet::new(),
            completed_instances: BTreeSet::new(),
        }
    }

    pub fn daily(interval: u32) -> Self {
        Self::new(Frequency::Daily, interval)
    }

    pub fn weekly(interval: u32, days: impl IntoIterator<Item = Weekday>) -> Self {
        Self::new(
            Frequency::Weekly {
                days: days.into_iter().collect(),
            },
            interval,
        )
    }

    pub fn monthly(interval: u32) -> Self {
        Self::new(Frequency::Monthly, interval)
    }

    pub fn with_end(mut self, end: EndCondition) -> Self {
        self.end = end;
        self
    }

    pub fn excluding(mut self, days: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.exclude_dates.extend(days);
        self
    }

    pub fn is_excluded(&self, day: NaiveDate) -> bool {
        self.exclude_dates.contains(&day)
    }

    /// Checks the shape constraints the engine relies on.
    ///
    /// An empty weekday set is accepted: such a rule simply never fires.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.interval == 0 {
            return Err(ScheduleError::InvalidPattern(
                "interval must be a positive integer".to_string(),
            ));
        }
        if let EndCondition::AfterOccurrences(0) = self.end {
            return Err(ScheduleError::InvalidPattern(
                "occurrence count must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Schedule Entries
// ============================================================================

/// A task or time block as handed to the engine by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    pub title: String,
    pub notes: Option<String>,
    /// Anchor instant in local wall-clock time. All-day entries sit at noon.
    pub scheduled_at: NaiveDateTime,
    pub is_all_day: bool,
    pub duration_minutes: Option<u32>,
    pub status: EntryStatus,
    pub parent_id: Option<Uuid>,
    /// Present iff the entry repeats
    pub recurrence: Option<RecurrencePattern>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEntry {
    pub fn new(kind: EntryKind, title: impl Into<String>, scheduled_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            title: title.into(),
            notes: None,
            scheduled_at,
            is_all_day: false,
            duration_minutes: None,
            status: EntryStatus::Pending,
            parent_id: None,
            recurrence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn task(title: impl Into<String>, scheduled_at: NaiveDateTime) -> Self {
        Self::new(EntryKind::Task, title, scheduled_at)
    }

    pub fn time_block(
        title: impl Into<String>,
        scheduled_at: NaiveDateTime,
        duration_minutes: u32,
    ) -> Self {
        let mut entry = Self::new(EntryKind::TimeBlock, title, scheduled_at);
        entry.duration_minutes = Some(duration_minutes);
        entry
    }

    pub fn all_day_task(title: impl Into<String>, day: NaiveDate) -> Self {
        let mut entry = Self::task(title, day.and_time(all_day_anchor_time()));
        entry.is_all_day = true;
        entry
    }

    pub fn recurring(mut self, pattern: RecurrencePattern) -> Self {
        self.recurrence = Some(pattern);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn anchor_day(&self) -> NaiveDate {
        self.scheduled_at.date()
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.scheduled_at.time()
    }

    /// Length of one occurrence. All-day entries without an explicit duration
    /// last until the end of their day, twelve hours past the noon anchor.
    pub fn duration(&self) -> Duration {
        match (self.duration_minutes, self.is_all_day) {
            (Some(minutes), _) => Duration::minutes(i64::from(minutes)),
            (None, true) => Duration::hours(12),
            (None, false) => Duration::zero(),
        }
    }

    /// Same entry under a fresh identity, as produced by a split.
    pub fn fork(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Last 8 hex digits of the id. UUIDv7 prefixes are timestamps, so the
    /// random tail is the part that tells entries apart.
    pub fn short_id(&self) -> String {
        let simple = self.id.simple().to_string();
        simple[simple.len() - 8..].to_string()
    }

    /// Applies the non-recurrence parts of `changes`. Recurrence changes are
    /// scope-dependent and handled by the splitter.
    pub fn apply_changes(&mut self, changes: &EntryChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(notes) = &changes.notes {
            self.notes = notes.clone();
        }
        if let Some(is_all_day) = changes.is_all_day {
            self.is_all_day = is_all_day;
            if is_all_day {
                self.scheduled_at = self.anchor_day().and_time(all_day_anchor_time());
            }
        }
        if let Some(time) = changes.time_of_day {
            if !self.is_all_day {
                self.scheduled_at = self.anchor_day().and_time(time);
            }
        }
        if let Some(duration) = changes.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(parent_id) = changes.parent_id {
            self.parent_id = parent_id;
        }
    }
}

// ============================================================================
// Data Transfer Objects
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewEntryData {
    pub kind: EntryKind,
    pub title: String,
    pub notes: Option<String>,
    pub scheduled_at: NaiveDateTime,
    pub is_all_day: bool,
    pub duration_minutes: Option<u32>,
    pub parent_id: Option<Uuid>,
    /// When present the entry becomes the anchor of a recurring series
    pub recurrence: Option<RecurrencePattern>,
}

impl NewEntryData {
    pub fn into_entry(self) -> ScheduleEntry {
        let scheduled_at = if self.is_all_day {
            self.scheduled_at.date().and_time(all_day_anchor_time())
        } else {
            self.scheduled_at
        };
        ScheduleEntry {
            id: Uuid::now_v7(),
            kind: self.kind,
            title: self.title,
            notes: self.notes,
            scheduled_at,
            is_all_day: self.is_all_day,
            duration_minutes: self.duration_minutes,
            status: EntryStatus::Pending,
            parent_id: self.parent_id,
            recurrence: self.recurrence,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// Attribute changes requested by an edit. `None` leaves a field untouched;
/// nested options clear the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryChanges {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub time_of_day: Option<NaiveTime>,
    pub is_all_day: Option<bool>,
    pub duration_minutes: Option<Option<u32>>,
    pub status: Option<EntryStatus>,
    pub parent_id: Option<Option<Uuid>>,
    /// New rule for the affected part of the series; `Some(None)` stops repeating
    pub recurrence: Option<Option<RecurrencePattern>>,
}

/// Which occurrences of a recurring entry an edit or delete affects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Affect only the selected occurrence
    ThisOccurrence,
    /// Affect the selected occurrence and every later one
    ThisAndFuture,
    /// Affect the whole series including past occurrences
    EntireSeries,
}

impl fmt::Display for EditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditScope::ThisOccurrence => write!(f, "this"),
            EditScope::ThisAndFuture => write!(f, "future"),
            EditScope::EntireSeries => write!(f, "all"),
        }
    }
}

impl FromStr for EditScope {
    type Err = ParseEditScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" | "occurrence" => Ok(EditScope::ThisOccurrence),
            "future" | "this_and_future" => Ok(EditScope::ThisAndFuture),
            "all" | "series" | "entire" => Ok(EditScope::EntireSeries),
            _ => Err(ParseEditScopeError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid edit scope: {0}")]
pub struct ParseEditScopeError(String);
