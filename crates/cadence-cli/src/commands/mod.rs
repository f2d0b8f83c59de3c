use anyhow::Result;
use cadence_core::calendar::ViewType;
use cadence_core::models::ScheduleEntry;
use cadence_core::recurrence::{EngineConfig, RecurrenceEngine};
use cadence_core::timezone::LocalZone;
use chrono::{Days, NaiveDate, NaiveDateTime};

pub mod add;
pub mod done;
pub mod edit;
pub mod list;
pub mod show;
pub mod stats;

/// Settings and the current moment, resolved once per invocation
#[derive(Debug, Clone)]
pub struct Context {
    pub zone: LocalZone,
    pub engine: EngineConfig,
    pub now: NaiveDateTime,
    pub default_view: ViewType,
}

impl Context {
    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

/// The occurrence a command targets when no `--date` is given: the current
/// one, or the first one for a series that has not started yet.
pub fn default_occurrence(entry: &ScheduleEntry, ctx: &Context) -> Result<NaiveDate> {
    let engine = RecurrenceEngine::for_entry(entry, ctx.engine)?;
    if let Some(day) = engine.current_instance_on_or_before(ctx.today())? {
        return Ok(day);
    }
    let horizon = entry
        .anchor_day()
        .checked_add_days(Days::new(3660))
        .unwrap_or(NaiveDate::MAX);
    match engine.occurrences_between(entry.anchor_day(), horizon).next() {
        Some(day) => Ok(day?),
        None => Ok(entry.anchor_day()),
    }
}
