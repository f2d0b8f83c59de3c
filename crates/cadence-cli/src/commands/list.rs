use anyhow::Result;
use cadence_core::agenda::agenda;
use cadence_core::calendar::{grid_days, step_date, Direction, ViewType};
use cadence_core::store::ScheduleStore;
use chrono::{Datelike, NaiveDate};
use log::debug;
use owo_colors::OwoColorize;

use crate::cli::{GridCommand, ListCommand};
use crate::commands::Context;
use crate::parser::parse_day;
use crate::views::table::{display_agenda, display_grid};

fn view_anchor(date: Option<&str>, ctx: &Context) -> Result<NaiveDate> {
    match date {
        Some(date) => parse_day(date, ctx.today()),
        None => Ok(ctx.today()),
    }
}

fn heading(view: ViewType, days: &[NaiveDate]) -> String {
    match (days.first(), days.last()) {
        (Some(first), Some(last)) if first == last => first.format("%A, %B %-d %Y").to_string(),
        (Some(first), Some(last)) => format!("{} ({} to {})", view, first, last),
        _ => view.to_string(),
    }
}

pub async fn list_agenda(store: &impl ScheduleStore, ctx: &Context, command: ListCommand) -> Result<()> {
    let view = command.view.unwrap_or(ctx.default_view);
    let direction = if command.offset < 0 {
        Direction::Backward
    } else {
        Direction::Forward
    };
    let mut anchor = view_anchor(command.date.as_deref(), ctx)?;
    for _ in 0..command.offset.unsigned_abs() {
        anchor = step_date(anchor, view, direction);
    }

    let days = grid_days(anchor, view);
    let entries = store.list_entries().await?;
    let items = agenda(&entries, &days, ctx.engine)?;
    debug!("{} entries expanded into {} items", entries.len(), items.len());

    println!("{}", heading(view, &days).bold());
    display_agenda(&items, ctx.today());
    Ok(())
}

pub async fn show_grid(store: &impl ScheduleStore, ctx: &Context, command: GridCommand) -> Result<()> {
    let view = command.view.unwrap_or(ctx.default_view);
    let anchor = view_anchor(command.date.as_deref(), ctx)?;
    let days = grid_days(anchor, view);

    let entries = store.list_entries().await?;
    let items = agenda(&entries, &days, ctx.engine)?;
    let counts: Vec<usize> = days
        .iter()
        .map(|day| items.iter().filter(|item| item.day == *day).count())
        .collect();

    let focus_month = (view == ViewType::Month).then(|| anchor.month());
    if view == ViewType::Month {
        println!("{}", anchor.format("%B %Y").to_string().bold());
    } else {
        println!("{}", heading(view, &days).bold());
    }
    display_grid(&days, &counts, ctx.today(), focus_month);
    Ok(())
}
