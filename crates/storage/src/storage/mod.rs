//! `SQLite` storage implementation - modular structure
//!
//! One module per entity family. The entity methods are synchronous and
//! crate-private; callers outside this crate reach them only through the
//! async port traits, which delegate here via `spawn_blocking` (see
//! `sqlite_async`).

// SQLite uses i64 for counts/limits, Rust uses usize/u32 - safe conversions within DB context
#![allow(
    clippy::as_conversions,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "SQLite i64 <-> Rust usize conversions are safe within DB row counts"
)]

mod audit;
mod domains;
mod globals;
mod platforms;
mod projects;
mod sessions;

use std::path::Path;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::broadcast;

use crate::error::StorageError;
use crate::events::ChangeEvent;
use crate::migrations;

/// Capacity of the change-event channel; writers never wait on it.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Main storage struct wrapping a `SQLite` connection pool and the
/// change-event feed.
#[derive(Clone, Debug)]
pub struct Storage {
    pub(crate) pool: Pool<SqliteConnectionManager>,
    pub(crate) events: broadcast::Sender<ChangeEvent>,
}

impl Storage {
    /// Open (or create) the database at `db_path` and run migrations.
    ///
    /// # Errors
    /// Returns `Unavailable` if the database cannot be opened and
    /// `Migration` if the schema cannot be brought up to date.
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.pragma_update(None, "foreign_keys", "ON"));
        let pool = Pool::new(manager)
            .map_err(|e| StorageError::Unavailable(format!("failed to open database: {e}")))?;

        let conn = pool
            .get()
            .map_err(|e| StorageError::Unavailable(format!("failed to get connection: {e}")))?;
        migrations::run_migrations(&conn).map_err(|e| StorageError::Migration(e.to_string()))?;
        drop(conn);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self { pool, events })
    }

    /// Default on-disk location: `<data dir>/ucl/context.db`.
    #[must_use]
    pub fn default_path() -> std::path::PathBuf {
        dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from(".")).join("ucl/context.db")
    }

    /// Subscribe to context change events. Events published while no
    /// subscriber exists are dropped, never buffered against the writer.
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Fire-and-forget event emission; must never block or fail a write.
    pub(crate) fn emit(&self, event: ChangeEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("change event dropped: no subscribers");
        }
    }
}

/// Get a connection from the pool.
pub(crate) fn get_conn(pool: &Pool<SqliteConnectionManager>) -> Result<PooledConn, StorageError> {
    pool.get().map_err(|e| StorageError::Unavailable(format!("connection pool: {e}")))
}

/// Parse JSON from a TEXT column, converting error to rusqlite error.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Serialize a value for a JSON TEXT column.
pub(crate) fn to_json<T: serde::Serialize>(v: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(v)?)
}

/// Parse an RFC 3339 TEXT column into a UTC timestamp.
pub(crate) fn parse_ts(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Parse an optional RFC 3339 TEXT column.
pub(crate) fn parse_opt_ts(s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|v| parse_ts(&v)).transpose()
}

/// Log row read errors and filter them out.
pub(crate) fn log_row_error<T>(result: rusqlite::Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Row read error: {}", e);
            None
        },
    }
}
