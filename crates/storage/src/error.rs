//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (not found, uniqueness
//! conflict, stale version) instead of downcasting opaque boxes. Only
//! `VersionConflict` is meant to be retried, and only by the caller
//! that issued the mutation.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for an expected-present entity.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness invariant violated on create (duplicate project name,
    /// second global context for a project, colliding platform/domain type).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stale `expected_version` on an optimistic update. Recoverable by
    /// re-read-and-retry; never silently resolved here.
    #[error("version conflict on {entity} {id}: expected {expected}, stored {actual}")]
    VersionConflict { entity: &'static str, id: String, expected: i64, actual: i64 },

    /// SQL or connection failure.
    #[error("database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// Store unreachable: pool exhausted or database cannot be opened.
    /// Not recovered from at this layer.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Row data could not be deserialized into a domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying the call).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Whether this error is a uniqueness-invariant violation.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether this error is a stale-version failure (re-read and retry).
    #[must_use]
    pub const fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Custom `From<rusqlite::Error>` — NOT blanket `#[from]`.
///
/// - constraint violation → `Conflict` (callers add entity context)
/// - everything else → `Database`
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(msg.clone().unwrap_or_else(|| "constraint violation".to_owned()))
            },
            _ => Self::Database(err),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption {
            context: "JSON serialization/deserialization".to_owned(),
            source: Box::new(err),
        }
    }
}
