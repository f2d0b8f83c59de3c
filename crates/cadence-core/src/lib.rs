//! # Cadence Core Library
//!
//! The recurrence and scheduling engine behind the Cadence task manager.
//!
//! ## Features
//!
//! - **Occurrence Math**: daily, weekly and monthly rules with intervals,
//!   weekday sets, exclusions and count or date termination
//! - **Series Splitting**: edit or delete "this", "this and future" or "all"
//!   occurrences by decomposing a series into head, body and tail
//! - **Instance Completion**: check off single occurrences without touching
//!   the series status
//! - **Spillover**: overnight and multi-day occurrences show up on every day
//!   they cover
//! - **Persistence**: SQLite store that applies split results atomically
//!
//! ## Core Modules
//!
//! - [`calendar`]: Day boundaries, view grids and view stepping
//! - [`timezone`]: The local calendar and epoch-millisecond conversion
//! - [`models`]: Entries, recurrence patterns and edit scopes
//! - [`recurrence`]: The occurrence-membership engine
//! - [`split`]: Head/body/tail decomposition for scoped edits and deletes
//! - [`completion`]: Per-instance completion and overdue detection
//! - [`stats`]: Habit statistics over a series
//! - [`agenda`]: Expansion of entries into dated items for a grid
//! - [`wire`]: JSON pattern records and RFC 5545 export
//! - [`db`] / [`store`]: Connection management and the scheduling store
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     db,
//!     models::{EditScope, EntryKind, NewEntryData, RecurrencePattern},
//!     split::{SeriesSplitter, SplitAction},
//!     store::{ScheduleStore, SqliteStore},
//!     timezone::LocalZone,
//! };
//! use chrono::{NaiveDate, Weekday};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cadence_core::error::ScheduleError> {
//!     let pool = db::establish_connection("cadence.db").await?;
//!     let store = SqliteStore::new(pool, LocalZone::parse("Europe/Berlin")?);
//!
//!     let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//!     let standup = store
//!         .add_entry(NewEntryData {
//!             kind: EntryKind::Task,
//!             title: "Standup".to_string(),
//!             notes: None,
//!             scheduled_at: monday.and_hms_opt(9, 30, 0).unwrap(),
//!             is_all_day: false,
//!             duration_minutes: Some(15),
//!             parent_id: None,
//!             recurrence: Some(RecurrencePattern::weekly(1, [Weekday::Mon, Weekday::Thu])),
//!         })
//!         .await?;
//!
//!     // Drop every standup from the second week on
//!     let second_week = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
//!     store
//!         .split_entry(
//!             standup.id,
//!             second_week,
//!             EditScope::ThisAndFuture,
//!             SplitAction::Delete,
//!             &SeriesSplitter::default(),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod agenda;
pub mod calendar;
pub mod completion;
pub mod db;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod split;
pub mod stats;
pub mod store;
pub mod timezone;
pub mod wire;
