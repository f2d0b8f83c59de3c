use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};

use crate::calendar::{date_in_month, days_in_month, month_ordinal, sunday_week_start, MS_PER_DAY};
use crate::error::ScheduleError;
use crate::models::{EndCondition, Frequency, RecurrencePattern, ScheduleEntry};

/// Default cap on the number of candidate days a single walk may visit.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Bounds for walks over a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Candidate days visited before a walk gives up with
    /// [`ScheduleError::IterationLimitExceeded`]
    pub max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// RecurrenceEngine: the occurrence-membership oracle for one pattern.
///
/// Responsibilities:
/// 1. Decide whether a calendar day holds an occurrence
/// 2. Number occurrences in enumeration order (1-based)
/// 3. Find the next structural occurrence after a day
/// 4. Enumerate occurrences lazily over a range
/// 5. Resolve the instance relevant "now" and multi-day spillover
///
/// All comparisons happen on day-keys; the anchor's time of day only
/// determines when an occurrence starts.
#[derive(Debug, Clone)]
pub struct RecurrenceEngine<'a> {
    pattern: &'a RecurrencePattern,
    anchor: NaiveDateTime,
    anchor_day: NaiveDate,
    interval: i64,
    config: EngineConfig,
}

impl<'a> RecurrenceEngine<'a> {
    /// Creates an engine for `pattern` anchored at `anchor`.
    ///
    /// # Errors
    /// * `InvalidPattern` - interval or occurrence count is zero
    pub fn new(pattern: &'a RecurrencePattern, anchor: NaiveDateTime) -> Result<Self, ScheduleError> {
        Self::with_config(pattern, anchor, EngineConfig::default())
    }

    pub fn with_config(
        pattern: &'a RecurrencePattern,
        anchor: NaiveDateTime,
        config: EngineConfig,
    ) -> Result<Self, ScheduleError> {
        pattern.validate()?;
        Ok(Self {
            pattern,
            anchor,
            anchor_day: anchor.date(),
            interval: i64::from(pattern.interval),
            config,
        })
    }

    /// Engine for a recurring entry, anchored at its scheduled instant.
    ///
    /// # Errors
    /// * `InvalidInstance` - the entry does not repeat
    /// * `InvalidPattern` - the entry's pattern is malformed
    pub fn for_entry(entry: &'a ScheduleEntry, config: EngineConfig) -> Result<Self, ScheduleError> {
        let pattern = entry.recurrence.as_ref().ok_or_else(|| {
            ScheduleError::InvalidInstance(format!("entry {} is not recurring", entry.id))
        })?;
        Self::with_config(pattern, entry.scheduled_at, config)
    }

    pub fn pattern(&self) -> &RecurrencePattern {
        self.pattern
    }

    pub fn anchor_day(&self) -> NaiveDate {
        self.anchor_day
    }

    /// Instant at which the occurrence on `day` starts.
    pub fn instant_on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.anchor.time())
    }

    /// Whether `day` holds an occurrence.
    ///
    /// Checks run in order and stop at the first failure: before the anchor,
    /// excluded, past the end date, frequency mismatch, past the occurrence
    /// count.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        if day < self.anchor_day {
            return false;
        }
        if self.pattern.is_excluded(day) {
            return false;
        }
        if let EndCondition::Until(end) = self.pattern.end {
            if day > end {
                return false;
            }
        }
        if !self.matches_structurally(day) {
            return false;
        }
        if let EndCondition::AfterOccurrences(count) = self.pattern.end {
            return self.structural_index(day) <= u64::from(count);
        }
        true
    }

    /// 1-based position of `day` in the series' enumeration order, or `None`
    /// when the rule does not fire on `day`.
    ///
    /// Excluded days and days past the end condition still carry the index
    /// they would have had, so exclusions never renumber the series.
    pub fn occurrence_index(&self, day: NaiveDate) -> Option<u32> {
        if !self.matches_structurally(day) {
            return None;
        }
        u32::try_from(self.structural_index(day)).ok()
    }

    /// Smallest day strictly after `day` on which the rule fires, ignoring
    /// exclusions and the end condition.
    ///
    /// A weekly rule without weekdays never fires; for it this degenerates to
    /// `day` plus `interval` weeks.
    pub fn next_occurrence_after(&self, day: NaiveDate) -> Option<NaiveDate> {
        let floor = day.succ_opt()?.max(self.anchor_day);
        match &self.pattern.frequency {
            Frequency::Daily => {
                let diff = (floor - self.anchor_day).num_days();
                let steps = (diff + self.interval - 1) / self.interval;
                self.anchor_day
                    .checked_add_days(Days::new(u64::try_from(steps * self.interval).ok()?))
            }
            Frequency::Weekly { days } if days.is_empty() => {
                day.checked_add_days(Days::new(u64::try_from(7 * self.interval).ok()?))
            }
            Frequency::Weekly { days } => {
                let anchor_week = sunday_week_start(self.anchor_day);
                let mut candidate = floor;
                // An active week is reached within two hops; the first active
                // week from its Sunday always contains a member weekday.
                for _ in 0..3 {
                    let offset = self.week_offset(candidate);
                    let next_offset = if offset % self.interval == 0 {
                        let from = candidate.weekday().num_days_from_sunday();
                        if let Some(found) = days
                            .iter()
                            .map(|d| d.num_days_from_sunday())
                            .find(|pos| *pos >= from)
                        {
                            return sunday_week_start(candidate)
                                .checked_add_days(Days::new(u64::from(found)));
                        }
                        offset + self.interval
                    } else {
                        (offset / self.interval + 1) * self.interval
                    };
                    candidate = anchor_week
                        .checked_add_days(Days::new(u64::try_from(next_offset * 7).ok()?))?;
                }
                None
            }
            Frequency::Monthly => {
                let anchor_month = month_ordinal(self.anchor_day);
                let diff = month_ordinal(floor) - anchor_month;
                let mut slot = (diff + self.interval - 1) / self.interval;
                // Every twelfth slot lands back on a month the anchor day exists in
                for _ in 0..=12 {
                    let month = anchor_month + slot * self.interval;
                    if let Some(date) = date_in_month(month, self.anchor_day.day()) {
                        if date >= floor {
                            return Some(date);
                        }
                    }
                    slot += 1;
                }
                None
            }
        }
    }

    /// Lazily enumerate occurrences in `start..=end`.
    ///
    /// The walk starts at `max(anchor, start)` and stops at `end` or once the
    /// end condition can no longer be met. Each call returns a fresh iterator.
    pub fn occurrences_between(&self, start: NaiveDate, end: NaiveDate) -> Occurrences<'_, 'a> {
        let from = start.max(self.anchor_day);
        Occurrences {
            engine: self,
            cursor: self.first_on_or_after(from),
            end,
            steps: 0,
            done: false,
        }
    }

    /// Latest occurrence on or before `today`, found by walking forward from
    /// the anchor.
    ///
    /// # Errors
    /// * `IterationLimitExceeded` - the walk visited more candidates than the
    ///   configured cap
    pub fn current_instance_on_or_before(
        &self,
        today: NaiveDate,
    ) -> Result<Option<NaiveDate>, ScheduleError> {
        let mut latest = None;
        for occurrence in self.occurrences_between(self.anchor_day, today) {
            latest = Some(occurrence?);
        }
        Ok(latest)
    }

    /// Start instants of every occurrence overlapping `day`, earliest first.
    ///
    /// An overnight occurrence from an earlier day is reported alongside the
    /// one starting on `day` itself. Scans back `ceil(duration / 1 day) + 1`
    /// days.
    pub fn occurrences_covering(&self, day: NaiveDate, duration: Duration) -> Vec<NaiveDateTime> {
        let day_begin = day.and_time(NaiveTime::MIN);
        let lookback = (duration.num_milliseconds() + MS_PER_DAY - 1).div_euclid(MS_PER_DAY) + 1;
        let lookback = u64::try_from(lookback.max(0)).unwrap_or(0);
        (0..=lookback)
            .rev()
            .filter_map(|back| day.checked_sub_days(Days::new(back)))
            .filter(|start_day| self.occurs_on(*start_day))
            .map(|start_day| self.instant_on(start_day))
            .filter(|starts_at| starts_at.date() == day || *starts_at + duration > day_begin)
            .collect()
    }

    fn first_on_or_after(&self, day: NaiveDate) -> Option<NaiveDate> {
        if let Frequency::Weekly { days } = &self.pattern.frequency {
            if days.is_empty() {
                return None;
            }
        }
        if self.matches_structurally(day) {
            Some(day)
        } else {
            self.next_occurrence_after(day)
        }
    }

    /// True once no day at or after the structural occurrence `day` can
    /// satisfy the end condition.
    fn is_exhausted(&self, day: NaiveDate) -> bool {
        match self.pattern.end {
            EndCondition::Never => false,
            EndCondition::Until(end) => day > end,
            EndCondition::AfterOccurrences(count) => self.structural_index(day) > u64::from(count),
        }
    }

    fn matches_structurally(&self, day: NaiveDate) -> bool {
        if day < self.anchor_day {
            return false;
        }
        match &self.pattern.frequency {
            Frequency::Daily => (day - self.anchor_day).num_days() % self.interval == 0,
            Frequency::Weekly { days } => {
                days.contains(day.weekday()) && self.week_offset(day) % self.interval == 0
            }
            Frequency::Monthly => {
                day.day() == self.anchor_day.day()
                    && (month_ordinal(day) - month_ordinal(self.anchor_day)) % self.interval == 0
            }
        }
    }

    /// Index of a day that matches structurally.
    fn structural_index(&self, day: NaiveDate) -> u64 {
        let index = match &self.pattern.frequency {
            Frequency::Daily => (day - self.anchor_day).num_days() / self.interval + 1,
            Frequency::Weekly { days } => {
                let cycle = self.week_offset(day) / self.interval;
                let anchor_pos = self.anchor_day.weekday().num_days_from_sunday();
                let target_pos = day.weekday().num_days_from_sunday();
                if cycle == 0 {
                    days.count_between(anchor_pos, target_pos) as i64
                } else {
                    // Partial first week, whole cycles in between, then the
                    // target's own week up to and including the target.
                    let first_week = days.count_between(anchor_pos, 6) as i64;
                    first_week + (cycle - 1) * days.len() as i64 + days.count_between(0, target_pos) as i64
                }
            }
            Frequency::Monthly => {
                let anchor_month = month_ordinal(self.anchor_day);
                let slots = (month_ordinal(day) - anchor_month) / self.interval;
                let dom = self.anchor_day.day();
                if dom <= 28 {
                    slots + 1
                } else {
                    (0..=slots)
                        .filter(|slot| days_in_month(anchor_month + slot * self.interval) >= dom)
                        .count() as i64
                }
            }
        };
        u64::try_from(index).unwrap_or(0)
    }

    /// Whole weeks between the Sunday-aligned weeks of the anchor and `day`.
    fn week_offset(&self, day: NaiveDate) -> i64 {
        (sunday_week_start(day) - sunday_week_start(self.anchor_day)).num_days() / 7
    }
}

/// Lazy walk over a series' occurrences in a day range.
///
/// Yields `Err(IterationLimitExceeded)` once if the walk exceeds the
/// engine's iteration cap, then ends.
#[derive(Debug, Clone)]
pub struct Occurrences<'e, 'a> {
    engine: &'e RecurrenceEngine<'a>,
    cursor: Option<NaiveDate>,
    end: NaiveDate,
    steps: usize,
    done: bool,
}

impl Iterator for Occurrences<'_, '_> {
    type Item = Result<NaiveDate, ScheduleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let candidate = match self.cursor {
                Some(day) if day <= self.end && !self.engine.is_exhausted(day) => day,
                _ => {
                    self.done = true;
                    return None;
                }
            };
            if self.steps >= self.engine.config.max_iterations {
                warn!(
                    "Occurrence walk from {} stopped after {} candidates",
                    self.engine.anchor_day, self.steps
                );
                self.done = true;
                return Some(Err(ScheduleError::IterationLimitExceeded(
                    self.engine.config.max_iterations,
                )));
            }
            self.steps += 1;
            self.cursor = self.engine.next_occurrence_after(candidate);
            if self.engine.occurs_on(candidate) {
                return Some(Ok(candidate));
            }
            debug!("Skipping excluded occurrence on {}", candidate);
        }
    }
}
