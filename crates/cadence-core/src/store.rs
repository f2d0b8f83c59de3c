use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use crate::completion::{toggle_current_instance, toggle_instance, ToggleOutcome};
use crate::db::DbPool;
use crate::error::ScheduleError;
use crate::models::{EditScope, EntryKind, EntryStatus, NewEntryData, ScheduleEntry};
use crate::recurrence::EngineConfig;
use crate::split::{SeriesSplitter, SplitAction, SplitOutcome};
use crate::timezone::LocalZone;
use crate::wire::{pattern_from_json, pattern_to_json};

/// Persistence for schedule entries. Handles are passed explicitly to
/// whatever needs them.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn add_entry(&self, data: NewEntryData) -> Result<ScheduleEntry, ScheduleError>;
    async fn find_entry(&self, id: Uuid) -> Result<Option<ScheduleEntry>, ScheduleError>;
    /// Entries whose id ends in `short_id`, or the one whose full id it is
    async fn find_entries_by_short_id(&self, short_id: &str) -> Result<Vec<ScheduleEntry>, ScheduleError>;
    async fn list_entries(&self) -> Result<Vec<ScheduleEntry>, ScheduleError>;
    /// Overwrites a stored entry; `NotFound` if it does not exist
    async fn save_entry(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError>;
    async fn delete_entry(&self, id: Uuid) -> Result<(), ScheduleError>;
    /// Persists every part of a split or none of them.
    async fn apply_split(&self, outcome: &SplitOutcome) -> Result<(), ScheduleError>;
    /// Loads `id`, splits it at `day` and applies the result atomically.
    async fn split_entry(
        &self,
        id: Uuid,
        day: NaiveDate,
        scope: EditScope,
        action: SplitAction,
        splitter: &SeriesSplitter,
    ) -> Result<SplitOutcome, ScheduleError>;
    /// Toggles the occurrence on `day`, or the current one as of `today`.
    async fn toggle_completion(
        &self,
        id: Uuid,
        day: Option<NaiveDate>,
        today: NaiveDate,
        config: EngineConfig,
    ) -> Result<(ScheduleEntry, ToggleOutcome), ScheduleError>;
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    kind: EntryKind,
    title: String,
    notes: Option<String>,
    scheduled_at: i64,
    is_all_day: bool,
    duration_minutes: Option<i64>,
    status: EntryStatus,
    parent_id: Option<Uuid>,
    recurrence: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_entry(self, zone: &LocalZone) -> Result<ScheduleEntry, ScheduleError> {
        let duration_minutes = self
            .duration_minutes
            .map(|minutes| {
                u32::try_from(minutes).map_err(|_| {
                    ScheduleError::InvalidInput(format!("Invalid duration: {} minutes", minutes))
                })
            })
            .transpose()?;
        let recurrence = self
            .recurrence
            .as_deref()
            .map(|json| pattern_from_json(json, zone))
            .transpose()?;

        Ok(ScheduleEntry {
            id: self.id,
            kind: self.kind,
            title: self.title,
            notes: self.notes,
            scheduled_at: zone.to_local(self.scheduled_at)?,
            is_all_day: self.is_all_day,
            duration_minutes,
            status: self.status,
            parent_id: self.parent_id,
            recurrence,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct SqliteStore {
    pool: DbPool,
    zone: LocalZone,
}

impl SqliteStore {
    pub fn new(pool: DbPool, zone: LocalZone) -> Self {
        Self { pool, zone }
    }

    pub fn zone(&self) -> &LocalZone {
        &self.zone
    }

    fn rows_into_entries(&self, rows: Vec<EntryRow>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        rows.into_iter().map(|row| row.into_entry(&self.zone)).collect()
    }

    fn recurrence_json(&self, entry: &ScheduleEntry) -> Result<Option<String>, ScheduleError> {
        entry
            .recurrence
            .as_ref()
            .map(|pattern| pattern_to_json(pattern, &self.zone))
            .transpose()
    }

    async fn find_entry_in_transaction(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let row: Option<EntryRow> = sqlx::query_as("SELECT * FROM schedule_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        row.map(|row| row.into_entry(&self.zone)).transpose()
    }

    async fn insert_in_transaction(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        entry: &ScheduleEntry,
    ) -> Result<(), ScheduleError> {
        sqlx::query(
            r#"INSERT INTO schedule_entries (id, kind, title, notes, scheduled_at, is_all_day, duration_minutes, status, parent_id, recurrence, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(entry.id)
        .bind(entry.kind)
        .bind(&entry.title)
        .bind(&entry.notes)
        .bind(self.zone.to_epoch_ms(entry.scheduled_at))
        .bind(entry.is_all_day)
        .bind(entry.duration_minutes)
        .bind(entry.status)
        .bind(entry.parent_id)
        .bind(self.recurrence_json(entry)?)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn update_in_transaction(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        entry: &ScheduleEntry,
        updated_at: DateTime<Utc>,
    ) -> Result<(), ScheduleError> {
        let result = sqlx::query(
            r#"UPDATE schedule_entries
            SET kind = $1, title = $2, notes = $3, scheduled_at = $4, is_all_day = $5,
                duration_minutes = $6, status = $7, parent_id = $8, recurrence = $9, updated_at = $10
            WHERE id = $11
            "#,
        )
        .bind(entry.kind)
        .bind(&entry.title)
        .bind(&entry.notes)
        .bind(self.zone.to_epoch_ms(entry.scheduled_at))
        .bind(entry.is_all_day)
        .bind(entry.duration_minutes)
        .bind(entry.status)
        .bind(entry.parent_id)
        .bind(self.recurrence_json(entry)?)
        .bind(updated_at)
        .bind(entry.id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::NotFound(entry.id.to_string()));
        }
        Ok(())
    }

    async fn delete_in_transaction(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<(), ScheduleError> {
        let result = sqlx::query("DELETE FROM schedule_entries WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ScheduleError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn apply_split_in_transaction(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        outcome: &SplitOutcome,
    ) -> Result<(), ScheduleError> {
        if let Some(head) = &outcome.head {
            self.update_in_transaction(tx, head, Utc::now()).await?;
        }
        if let Some(body) = &outcome.body {
            self.insert_in_transaction(tx, body).await?;
        }
        if let Some(tail) = &outcome.tail {
            self.insert_in_transaction(tx, tail).await?;
        }
        if let Some(id) = outcome.removed {
            self.delete_in_transaction(tx, id).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn add_entry(&self, data: NewEntryData) -> Result<ScheduleEntry, ScheduleError> {
        if let Some(pattern) = &data.recurrence {
            pattern.validate()?;
        }
        let entry = data.into_entry();

        let mut tx = self.pool.begin().await?;
        self.insert_in_transaction(&mut tx, &entry).await?;
        tx.commit().await?;

        debug!("Added entry {} '{}'", entry.id, entry.title);
        Ok(entry)
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let row: Option<EntryRow> = sqlx::query_as("SELECT * FROM schedule_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row.into_entry(&self.zone)).transpose()
    }

    async fn find_entries_by_short_id(&self, short_id: &str) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        if let Ok(id) = Uuid::parse_str(short_id) {
            return Ok(self.find_entry(id).await?.into_iter().collect());
        }
        let needle = short_id.replace('-', "").to_lowercase();
        // Only hex digits can match, and `%`/`_` must not reach the LIKE pattern
        if needle.is_empty() || !needle.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Vec::new());
        }
        let rows: Vec<EntryRow> =
            sqlx::query_as("SELECT * FROM schedule_entries WHERE lower(hex(id)) LIKE $1 ORDER BY scheduled_at")
                .bind(format!("%{}", needle))
                .fetch_all(&self.pool)
                .await?;
        self.rows_into_entries(rows)
    }

    async fn list_entries(&self) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let rows: Vec<EntryRow> =
            sqlx::query_as("SELECT * FROM schedule_entries ORDER BY scheduled_at, created_at")
                .fetch_all(&self.pool)
                .await?;
        self.rows_into_entries(rows)
    }

    async fn save_entry(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError> {
        if let Some(pattern) = &entry.recurrence {
            pattern.validate()?;
        }
        let updated_at = Utc::now();
        let mut tx = self.pool.begin().await?;
        self.update_in_transaction(&mut tx, entry, updated_at).await?;
        tx.commit().await?;

        Ok(ScheduleEntry {
            updated_at,
            ..entry.clone()
        })
    }

    async fn delete_entry(&self, id: Uuid) -> Result<(), ScheduleError> {
        let mut tx = self.pool.begin().await?;
        self.delete_in_transaction(&mut tx, id).await?;
        tx.commit().await?;
        debug!("Deleted entry {}", id);
        Ok(())
    }

    async fn apply_split(&self, outcome: &SplitOutcome) -> Result<(), ScheduleError> {
        let mut tx = self.pool.begin().await?;
        self.apply_split_in_transaction(&mut tx, outcome).await?;
        tx.commit().await?;
        debug!(
            "Applied split (head: {}, body: {}, tail: {}, removed: {:?})",
            outcome.head.is_some(),
            outcome.body.is_some(),
            outcome.tail.is_some(),
            outcome.removed
        );
        Ok(())
    }

    async fn split_entry(
        &self,
        id: Uuid,
        day: NaiveDate,
        scope: EditScope,
        action: SplitAction,
        splitter: &SeriesSplitter,
    ) -> Result<SplitOutcome, ScheduleError> {
        let mut tx = self.pool.begin().await?;
        let original = self
            .find_entry_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;

        let outcome = splitter.split(&original, day, scope, &action)?;
        self.apply_split_in_transaction(&mut tx, &outcome).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn toggle_completion(
        &self,
        id: Uuid,
        day: Option<NaiveDate>,
        today: NaiveDate,
        config: EngineConfig,
    ) -> Result<(ScheduleEntry, ToggleOutcome), ScheduleError> {
        let mut tx = self.pool.begin().await?;
        let mut entry = self
            .find_entry_in_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(id.to_string()))?;

        let outcome = match day {
            Some(day) => toggle_instance(&mut entry, day, config)?,
            None => toggle_current_instance(&mut entry, today, config)?,
        };
        let updated_at = Utc::now();
        self.update_in_transaction(&mut tx, &entry, updated_at).await?;
        tx.commit().await?;

        entry.updated_at = updated_at;
        Ok((entry, outcome))
    }
}
