use crate::error::ScheduleError;
use log::debug;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

pub type DbPool = SqlitePool;

/// Opens (creating if needed) the database and runs pending migrations.
///
/// Accepts a plain file path or an sqlx URL such as `sqlite::memory:`.
/// In-memory databases get a single long-lived connection so every query
/// sees the same data.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ScheduleError> {
    let in_memory = database_url.contains(":memory:");
    let options = if database_url.starts_with("sqlite:") || in_memory {
        SqliteConnectOptions::from_str(database_url)?
    } else {
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        SqliteConnectOptions::new().filename(database_url)
    };
    let options = options.create_if_missing(true).foreign_keys(true);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    debug!("Database ready at {}", database_url);
    Ok(pool)
}
