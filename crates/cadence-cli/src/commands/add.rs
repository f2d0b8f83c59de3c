use anyhow::Result;
use cadence_core::error::ScheduleError;
use cadence_core::models::{EntryKind, NewEntryData};
use cadence_core::store::ScheduleStore;
use chrono::Timelike;
use owo_colors::OwoColorize;

use crate::cli::AddCommand;
use crate::commands::Context;
use crate::parser::parse_when;
use crate::util::{build_pattern, resolve_entry_id};
use crate::views::table::describe_pattern;

pub async fn add_entry(store: &impl ScheduleStore, ctx: &Context, command: AddCommand) -> Result<()> {
    let scheduled_at = match &command.at {
        Some(at) => parse_when(at, ctx.now)?,
        None => ctx
            .now
            .with_second(0)
            .and_then(|now| now.with_nanosecond(0))
            .unwrap_or(ctx.now),
    };
    if command.block && command.duration.is_none() && !command.all_day {
        return Err(ScheduleError::InvalidInput("time blocks need a --duration".to_string()).into());
    }

    let parent_id = match &command.parent {
        Some(parent) => Some(resolve_entry_id(store, parent).await?),
        None => None,
    };
    let recurrence = build_pattern(&command.recurrence, scheduled_at.date(), ctx.today())?;

    let entry = store
        .add_entry(NewEntryData {
            kind: if command.block {
                EntryKind::TimeBlock
            } else {
                EntryKind::Task
            },
            title: command.title,
            notes: command.notes,
            scheduled_at,
            is_all_day: command.all_day,
            duration_minutes: command.duration,
            parent_id,
            recurrence,
        })
        .await?;

    let kind = match entry.kind {
        EntryKind::Task => "task",
        EntryKind::TimeBlock => "time block",
    };
    let when = if entry.is_all_day {
        entry.anchor_day().to_string()
    } else {
        entry.scheduled_at.format("%Y-%m-%d %H:%M").to_string()
    };
    match &entry.recurrence {
        Some(pattern) => println!(
            "{} Created recurring {} '{}' [{}] starting {}, {}",
            "✓".green(),
            kind,
            entry.title,
            entry.short_id().yellow(),
            when,
            describe_pattern(pattern)
        ),
        None => println!(
            "{} Created {} '{}' [{}] at {}",
            "✓".green(),
            kind,
            entry.title,
            entry.short_id().yellow(),
            when
        ),
    }
    Ok(())
}
