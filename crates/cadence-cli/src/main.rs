use cadence_core::db;
use cadence_core::error::ScheduleError;
use cadence_core::store::SqliteStore;
use clap::Parser;
use env_logger::Env;
use log::{debug, warn};
use owo_colors::{OwoColorize, Style};

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

use cli::Commands;
use commands::Context;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = cli::Cli::parse();

    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let config = config::Config::new().unwrap_or_else(|e| {
        warn!("Ignoring unreadable configuration: {}", e);
        config::Config::default()
    });
    let zone = config.zone()?;
    debug!("Using database {} in zone {}", config.database_path, zone.name());

    let pool = db::establish_connection(&config.database_path).await?;
    let store = SqliteStore::new(pool, zone);
    let ctx = Context {
        zone,
        engine: config.engine(),
        now: zone.now(),
        default_view: config.default_view,
    };

    match cli.command {
        Commands::Add(command) => commands::add::add_entry(&store, &ctx, command).await,
        Commands::List(command) => commands::list::list_agenda(&store, &ctx, command).await,
        Commands::Grid(command) => commands::list::show_grid(&store, &ctx, command).await,
        Commands::Show(command) => commands::show::show_entry(&store, &ctx, command).await,
        Commands::Preview(command) => commands::show::preview_entry(&store, &ctx, command).await,
        Commands::Edit(command) => commands::edit::edit_entry(&store, &ctx, command).await,
        Commands::Delete(command) => commands::edit::delete_entry(&store, &ctx, command).await,
        Commands::Done(command) => commands::done::set_completion(&store, &ctx, command, true).await,
        Commands::Undone(command) => {
            commands::done::set_completion(&store, &ctx, command, false).await
        }
        Commands::Stats(command) => commands::stats::show_stats(&store, &ctx, command).await,
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<ScheduleError>() {
        Some(ScheduleError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(ScheduleError::AmbiguousId(entries)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in entries {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(ScheduleError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(ScheduleError::InvalidPattern(s)) => {
            eprintln!("{} Invalid recurrence: {}", "Error:".style(error_style), s);
        }
        Some(ScheduleError::InvalidInstance(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s.yellow());
        }
        Some(ScheduleError::IterationLimitExceeded(limit)) => {
            eprintln!(
                "{} Gave up after visiting {} candidate days; raise max_iterations or narrow the range",
                "Error:".style(error_style),
                limit
            );
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
