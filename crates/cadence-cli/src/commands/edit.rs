use anyhow::Result;
use cadence_core::error::ScheduleError;
use cadence_core::models::{EditScope, EntryChanges, ScheduleEntry};
use cadence_core::split::{SeriesSplitter, SplitAction, SplitOutcome};
use cadence_core::store::ScheduleStore;
use chrono::NaiveDate;
use dialoguer::{Confirm, Select};
use owo_colors::OwoColorize;

use crate::cli::{DeleteCommand, EditCommand};
use crate::commands::show::load_entry;
use crate::commands::{default_occurrence, Context};
use crate::parser::{parse_day, parse_time, parse_when};
use crate::util::{build_pattern, resolve_entry_id};

const SCOPES: [EditScope; 3] = [
    EditScope::ThisOccurrence,
    EditScope::ThisAndFuture,
    EditScope::EntireSeries,
];

fn choose_scope(given: Option<EditScope>, verb: &str, day: NaiveDate) -> Result<EditScope> {
    if let Some(scope) = given {
        return Ok(scope);
    }
    let labels = [
        format!("Only the occurrence on {}", day),
        format!("The occurrence on {} and all later ones", day),
        "Every occurrence".to_string(),
    ];
    let picked = Select::new()
        .with_prompt(format!("This entry repeats. What do you want to {}?", verb))
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(SCOPES[picked])
}

fn occurrence_day(date: Option<&str>, entry: &ScheduleEntry, ctx: &Context) -> Result<NaiveDate> {
    match date {
        Some(date) => parse_day(date, ctx.today()),
        None => default_occurrence(entry, ctx),
    }
}

fn summarize(outcome: &SplitOutcome) {
    if let Some(body) = &outcome.body {
        println!("  {} one-off entry [{}] on {}", "+".green(), body.short_id().yellow(), body.anchor_day());
    }
    if let Some(tail) = &outcome.tail {
        println!("  {} new series [{}] from {}", "+".green(), tail.short_id().yellow(), tail.anchor_day());
    }
    if let Some(id) = outcome.removed {
        println!("  {} removed {}", "-".red(), id);
    }
}

pub async fn edit_entry(store: &impl ScheduleStore, ctx: &Context, command: EditCommand) -> Result<()> {
    let id = resolve_entry_id(store, &command.id).await?;
    let mut entry = load_entry(store, id).await?;

    let day = if entry.is_recurring() {
        occurrence_day(command.date.as_deref(), &entry, ctx)?
    } else {
        entry.anchor_day()
    };

    let recurrence = if command.recurrence_clear {
        Some(None)
    } else {
        build_pattern(&command.recurrence, day, ctx.today())?.map(Some)
    };
    let is_all_day = match (command.all_day, command.timed) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let changes = EntryChanges {
        title: command.title,
        notes: if command.notes_clear {
            Some(None)
        } else {
            command.notes.map(Some)
        },
        time_of_day: command.time.as_deref().map(parse_time).transpose()?,
        is_all_day,
        duration_minutes: if command.duration_clear {
            Some(None)
        } else {
            command.duration.map(Some)
        },
        status: command.status,
        parent_id: None,
        recurrence,
    };

    if !entry.is_recurring() {
        if let Some(at) = &command.at {
            entry.scheduled_at = parse_when(at, ctx.now)?;
        }
        entry.apply_changes(&changes);
        if let Some(Some(pattern)) = changes.recurrence {
            entry.recurrence = Some(pattern);
        }
        let entry = store.save_entry(&entry).await?;
        println!("{} Updated '{}' [{}]", "✓".green(), entry.title, entry.short_id().yellow());
        return Ok(());
    }

    if command.at.is_some() {
        return Err(ScheduleError::InvalidInput(
            "--at only reschedules one-off entries; use --date with --time for a series".to_string(),
        )
        .into());
    }
    let scope = choose_scope(command.scope, "edit", day)?;
    let splitter = SeriesSplitter::new(ctx.engine);
    let outcome = store
        .split_entry(id, day, scope, SplitAction::Edit(changes), &splitter)
        .await?;
    println!("{} Updated '{}' ({})", "✓".green(), entry.title, scope);
    summarize(&outcome);
    Ok(())
}

pub async fn delete_entry(store: &impl ScheduleStore, ctx: &Context, command: DeleteCommand) -> Result<()> {
    let id = resolve_entry_id(store, &command.id).await?;
    let entry = load_entry(store, id).await?;

    if !entry.is_recurring() {
        if !confirm(command.force, format!("Are you sure you want to delete '{}'?", entry.title)) {
            println!("Deletion cancelled.");
            return Ok(());
        }
        store.delete_entry(id).await?;
        println!("{} Deleted '{}'", "✓".green(), entry.title);
        return Ok(());
    }

    let day = occurrence_day(command.date.as_deref(), &entry, ctx)?;
    let scope = choose_scope(command.scope, "delete", day)?;
    let prompt = match scope {
        EditScope::ThisOccurrence => format!("Delete the occurrence of '{}' on {}?", entry.title, day),
        EditScope::ThisAndFuture => {
            format!("Delete '{}' from {} onwards?", entry.title, day)
        }
        EditScope::EntireSeries => format!("Delete every occurrence of '{}'?", entry.title),
    };
    if !confirm(command.force, prompt) {
        println!("Deletion cancelled.");
        return Ok(());
    }

    let splitter = SeriesSplitter::new(ctx.engine);
    let outcome = store
        .split_entry(id, day, scope, SplitAction::Delete, &splitter)
        .await?;
    println!("{} Deleted '{}' ({})", "✓".green(), entry.title, scope);
    summarize(&outcome);
    Ok(())
}

fn confirm(force: bool, prompt: String) -> bool {
    force
        || Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
}
