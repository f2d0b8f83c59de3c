use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    #[error("Iteration limit of {0} exceeded while walking a recurrence series")]
    IterationLimitExceeded(usize),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Ambiguous ID: matches {} entries", .0.len())]
    AmbiguousId(Vec<(String, String)>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
