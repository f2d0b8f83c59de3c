use anyhow::Result;
use cadence_core::stats::series_statistics;
use cadence_core::store::ScheduleStore;

use crate::cli::StatsCommand;
use crate::commands::show::load_entry;
use crate::commands::Context;
use crate::parser::parse_day;
use crate::util::resolve_entry_id;
use crate::views::table::display_stats;

pub async fn show_stats(store: &impl ScheduleStore, ctx: &Context, command: StatsCommand) -> Result<()> {
    let id = resolve_entry_id(store, &command.id).await?;
    let entry = load_entry(store, id).await?;

    let start = match &command.from {
        Some(from) => parse_day(from, ctx.today())?,
        None => entry.anchor_day(),
    };
    let end = match &command.to {
        Some(to) => parse_day(to, ctx.today())?,
        None => ctx.today(),
    };

    let stats = series_statistics(&entry, start, end, ctx.engine)?;
    display_stats(&entry.title, &stats);
    Ok(())
}
