use anyhow::Result;
use cadence_core::completion::ToggleOutcome;
use cadence_core::error::ScheduleError;
use cadence_core::models::EntryStatus;
use cadence_core::store::ScheduleStore;
use owo_colors::OwoColorize;

use crate::cli::DoneCommand;
use crate::commands::show::load_entry;
use crate::commands::{default_occurrence, Context};
use crate::parser::parse_day;
use crate::util::resolve_entry_id;

/// Marks an entry (or one occurrence of a series) done when `done` is set,
/// and reopens it otherwise. Already being in the requested state is not an
/// error.
pub async fn set_completion(
    store: &impl ScheduleStore,
    ctx: &Context,
    command: DoneCommand,
    done: bool,
) -> Result<()> {
    let id = resolve_entry_id(store, &command.id).await?;
    let entry = load_entry(store, id).await?;

    let Some(pattern) = &entry.recurrence else {
        if command.date.is_some() {
            return Err(ScheduleError::InvalidInput(format!(
                "'{}' does not repeat; --date only applies to recurring entries",
                entry.title
            ))
            .into());
        }
        if (entry.status == EntryStatus::Completed) == done {
            println!("'{}' is already {}.", entry.title, entry.status);
            return Ok(());
        }
        let (entry, _) = store.toggle_completion(id, None, ctx.today(), ctx.engine).await?;
        report(&entry.title, None, entry.status == EntryStatus::Completed);
        return Ok(());
    };

    let day = match &command.date {
        Some(date) => parse_day(date, ctx.today())?,
        None => default_occurrence(&entry, ctx)?,
    };
    if pattern.is_complete(day) == done {
        let state = if done { "done" } else { "open" };
        println!("'{}' on {} is already {}.", entry.title, day, state);
        return Ok(());
    }

    let (entry, outcome) = store
        .toggle_completion(id, Some(day), ctx.today(), ctx.engine)
        .await?;
    match outcome {
        ToggleOutcome::Instance { day, completed } => report(&entry.title, Some(day), completed),
        ToggleOutcome::Status(status) => report(&entry.title, None, status == EntryStatus::Completed),
    }
    Ok(())
}

fn report(title: &str, day: Option<chrono::NaiveDate>, completed: bool) {
    let on = day.map(|d| format!(" for {}", d)).unwrap_or_default();
    if completed {
        println!("{} Completed '{}'{}", "✓".green(), title, on);
    } else {
        println!("{} Reopened '{}'{}", "↺".yellow(), title, on);
    }
}
