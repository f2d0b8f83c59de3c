use anyhow::Result;
use cadence_core::completion::is_overdue;
use cadence_core::error::ScheduleError;
use cadence_core::models::ScheduleEntry;
use cadence_core::recurrence::RecurrenceEngine;
use cadence_core::store::ScheduleStore;
use chrono::{Days, NaiveDate};
use log::warn;
use owo_colors::OwoColorize;
use uuid::Uuid;

use crate::cli::{PreviewCommand, ShowCommand};
use crate::commands::Context;
use crate::parser::parse_day;
use crate::util::resolve_entry_id;
use crate::views::table::{display_entry, display_occurrences};

/// How far ahead `preview` searches before giving up.
const PREVIEW_HORIZON_DAYS: u64 = 366 * 20;

pub(crate) async fn load_entry(store: &impl ScheduleStore, id: Uuid) -> Result<ScheduleEntry> {
    store
        .find_entry(id)
        .await?
        .ok_or_else(|| ScheduleError::NotFound(format!("Entry with ID '{}' not found", id)).into())
}

pub async fn show_entry(store: &impl ScheduleStore, ctx: &Context, command: ShowCommand) -> Result<()> {
    let id = resolve_entry_id(store, &command.id).await?;
    let entry = load_entry(store, id).await?;

    let rrule = match &entry.recurrence {
        Some(pattern) => match pattern.to_rrule(entry.scheduled_at, &ctx.zone) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!("Could not export entry {} as iCalendar: {}", entry.id, e);
                None
            }
        },
        None => None,
    };
    display_entry(&entry, ctx.zone.name(), rrule.as_deref());

    if is_overdue(&entry, ctx.now, ctx.engine)? {
        println!("{}", "Overdue".red().bold());
    }
    Ok(())
}

pub async fn preview_entry(store: &impl ScheduleStore, ctx: &Context, command: PreviewCommand) -> Result<()> {
    let id = resolve_entry_id(store, &command.id).await?;
    let entry = load_entry(store, id).await?;
    let from = match &command.from {
        Some(from) => parse_day(from, ctx.today())?,
        None => ctx.today(),
    };

    let days = if entry.is_recurring() {
        let engine = RecurrenceEngine::for_entry(&entry, ctx.engine)?;
        let horizon = from
            .checked_add_days(Days::new(PREVIEW_HORIZON_DAYS))
            .unwrap_or(NaiveDate::MAX);
        engine
            .occurrences_between(from, horizon)
            .take(command.count)
            .collect::<Result<Vec<_>, _>>()?
    } else if entry.anchor_day() >= from {
        vec![entry.anchor_day()]
    } else {
        Vec::new()
    };

    println!("{}", format!("Upcoming occurrences of '{}'", entry.title).bold());
    display_occurrences(&entry, &days);
    Ok(())
}
