// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite connection pool with typed participation queries.
//!
//! This is the persistence collaborator behind the participation registry:
//! - `find_participation` (lookup by user/event pair)
//! - `insert_participation` (written by the registration workflow)

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::models::{EventId, NewParticipation, ParticipationRecord, UserId};

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        Self::Query(e.to_string())
    }
}

/// Raw row; ids are signed in SQLite.
#[derive(sqlx::FromRow)]
struct ParticipationRow {
    id: i64,
    user_id: i64,
    event_id: i64,
    registered_at: DateTime<Utc>,
}

impl TryFrom<ParticipationRow> for ParticipationRecord {
    type Error = DatabaseError;

    fn try_from(row: ParticipationRow) -> Result<Self, Self::Error> {
        let user_id = u64::try_from(row.user_id)
            .map_err(|_| DatabaseError::Query(format!("negative user_id in row {}", row.id)))?;
        let event_id = u64::try_from(row.event_id)
            .map_err(|_| DatabaseError::Query(format!("negative event_id in row {}", row.id)))?;

        Ok(Self {
            id: row.id,
            user_id: UserId(user_id),
            event_id: EventId(event_id),
            registered_at: row.registered_at,
        })
    }
}

/// SQLite database handle. Cheap to clone (shares the pool).
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open or create a database file, enabling WAL and running migrations.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io(e.to_string()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
            .map_err(|e| DatabaseError::Connection(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        tracing::info!(path = %path.display(), "Database opened");

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open a private in-memory database (for testing).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DatabaseError::Connection(e.to_string()))?
            .foreign_keys(true);

        // A single connection that never recycles, or the data vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        tracing::debug!("Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool. Every later query fails.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ─── Participation Operations ────────────────────────────────

    /// Find the registration of a user for an event.
    pub async fn find_participation(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<ParticipationRecord>, DatabaseError> {
        // Ids beyond i64 can never have been stored.
        let (Ok(user), Ok(event)) = (i64::try_from(user_id.0), i64::try_from(event_id.0)) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, ParticipationRow>(
            r"
            SELECT id, user_id, event_id, registered_at
            FROM participations
            WHERE user_id = ? AND event_id = ?
            ",
        )
        .bind(user)
        .bind(event)
        .fetch_optional(self.pool())
        .await?;

        row.map(ParticipationRecord::try_from).transpose()
    }

    /// Insert a participation, returning its row id.
    ///
    /// Fails with [`DatabaseError::Duplicate`] if the pair is already registered.
    pub async fn insert_participation(
        &self,
        record: &NewParticipation,
    ) -> Result<i64, DatabaseError> {
        let user = i64::try_from(record.user_id.0)
            .map_err(|_| DatabaseError::Query(format!("user_id {} out of range", record.user_id)))?;
        let event = i64::try_from(record.event_id.0).map_err(|_| {
            DatabaseError::Query(format!("event_id {} out of range", record.event_id))
        })?;

        let result = sqlx::query(
            r"
            INSERT INTO participations (user_id, event_id, registered_at)
            VALUES (?, ?, ?)
            ",
        )
        .bind(user)
        .bind(event)
        .bind(record.registered_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DatabaseError::Duplicate(format!(
                        "user {} already registered for event {}",
                        record.user_id, record.event_id
                    ));
                }
            }
            DatabaseError::from(e)
        })?;

        let id = result.last_insert_rowid();
        tracing::debug!(
            id,
            user_id = record.user_id.0,
            event_id = record.event_id.0,
            "Participation inserted"
        );
        Ok(id)
    }

    /// Number of users registered for an event.
    pub async fn count_participants(&self, event_id: EventId) -> Result<u64, DatabaseError> {
        let Ok(event) = i64::try_from(event_id.0) else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participations WHERE event_id = ?")
            .bind(event)
            .fetch_one(self.pool())
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
