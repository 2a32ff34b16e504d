//! SQLite store for turns and profiles.
//!
//! Uses a single SQLite database file with two tables:
//! - `turns`: append-only conversation log; `iid` gives the insertion order
//! - `profiles`: one row per user, overwritten on every refresh
//!
//! WAL mode lets a background profile refresh write while the foreground
//! reads the turn window.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rapport_core::error::StorageError;
use rapport_core::store::{ChatStore, ProfileStore};
use rapport_core::turn::{Profile, Turn};
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite-backed [`ChatStore`] and [`ProfileStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Tables and indexes are created automatically.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let store = Self::connect(options, 4).await?;
        info!("SQLite store initialized at {}", path.display());
        Ok(store)
    }

    /// An in-process ephemeral database (useful for tests).
    ///
    /// Held on a single connection that never idles out; the database lives
    /// exactly as long as that connection.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Open(format!("Invalid SQLite URL: {e}")))?;
        Self::connect(options, 1).await
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self, StorageError> {
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Open(format!("Failed to open SQLite: {e}")))?;

        Self::from_pool(pool).await
    }

    /// Run schema migrations: creates tables and indexes.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                user_id     TEXT NOT NULL,
                speaker     TEXT NOT NULL,
                text        TEXT NOT NULL,
                is_user     INTEGER NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration(format!("turns table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_turns_user_iid ON turns(user_id, iid DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Migration(format!("turns index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id       TEXT PRIMARY KEY NOT NULL,
                personality   TEXT NOT NULL,
                worldview     TEXT NOT NULL,
                chat_history  TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration(format!("profiles table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    async fn insert_turn<'e, E>(executor: E, turn: &Turn) -> Result<(), StorageError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO turns (id, user_id, speaker, text, is_user, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&turn.id)
        .bind(&turn.user_id)
        .bind(&turn.speaker)
        .bind(&turn.text)
        .bind(turn.is_user)
        .bind(turn.created_at.to_rfc3339())
        .execute(executor)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                StorageError::DuplicateTurn(turn.id.clone())
            } else {
                StorageError::Write(format!("INSERT turn failed: {e}"))
            }
        })?;
        Ok(())
    }

    /// Parse a `Turn` from a SQLite row.
    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<Turn, StorageError> {
        let column = |name: &str, e: sqlx::Error| StorageError::Query(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let user_id: String = row.try_get("user_id").map_err(|e| column("user_id", e))?;
        let speaker: String = row.try_get("speaker").map_err(|e| column("speaker", e))?;
        let text: String = row.try_get("text").map_err(|e| column("text", e))?;
        let is_user: bool = row.try_get("is_user").map_err(|e| column("is_user", e))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| column("created_at", e))?;

        let created_at = parse_timestamp("created_at", &created_at_str)?;

        Ok(Turn {
            id,
            user_id,
            speaker,
            text,
            is_user,
            created_at,
        })
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, turn: Turn) -> Result<(), StorageError> {
        Self::insert_turn(&self.pool, &turn).await?;
        debug!(turn_id = %turn.id, user_id = %turn.user_id, "Stored turn");
        Ok(())
    }

    async fn append_exchange(&self, user_turn: Turn, bot_turn: Turn) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Write(format!("BEGIN failed: {e}")))?;

        // Dropping `tx` on an early return rolls both inserts back
        Self::insert_turn(&mut *tx, &user_turn).await?;
        Self::insert_turn(&mut *tx, &bot_turn).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Write(format!("COMMIT failed: {e}")))?;

        debug!(user_id = %user_turn.user_id, "Stored exchange");
        Ok(())
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, speaker, text, is_user, created_at
            FROM turns
            WHERE user_id = ?1
            ORDER BY iid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Query(format!("recent turns: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }

    async fn count(&self, user_id: &str) -> Result<usize, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM turns WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Query(format!("count: {e}")))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StorageError::Query(format!("count column: {e}")))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn upsert(&self, profile: Profile) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, personality, worldview, chat_history, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                personality = excluded.personality,
                worldview = excluded.worldview,
                chat_history = excluded.chat_history,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.personality_summary)
        .bind(&profile.worldview_summary)
        .bind(&profile.chat_history_summary)
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Write(format!("UPSERT profile failed: {e}")))?;

        debug!(user_id = %profile.user_id, "Stored profile");
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<Profile>, StorageError> {
        let row = sqlx::query(
            "SELECT user_id, personality, worldview, chat_history, updated_at FROM profiles WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Query(format!("get profile: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let column = |name: &str, e: sqlx::Error| StorageError::Query(format!("{name} column: {e}"));
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| column("updated_at", e))?;

        Ok(Some(Profile {
            user_id: row.try_get("user_id").map_err(|e| column("user_id", e))?,
            personality_summary: row
                .try_get("personality")
                .map_err(|e| column("personality", e))?,
            worldview_summary: row.try_get("worldview").map_err(|e| column("worldview", e))?,
            chat_history_summary: row
                .try_get("chat_history")
                .map_err(|e| column("chat_history", e))?,
            updated_at: parse_timestamp("updated_at", &updated_at_str)?,
        }))
    }
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query(format!("{column} column: bad timestamp '{raw}': {e}")))
}
