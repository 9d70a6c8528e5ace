//! Typed error enum for the service layer.
//!
//! Unifies storage failures with the lifecycle and validation failures
//! introduced at this layer, so driving adapters can match on specific
//! failure modes instead of downcasting opaque `anyhow::Error` boxes.

use thiserror::Error;
use ucl_storage::StorageError;

/// Service-layer error for the context, session, query, and analytics
/// services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (not found, conflict, stale version,
    /// store unavailable).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Referenced entity does not exist (unknown project, session, …).
    #[error("not found: {0}")]
    NotFound(String),

    /// Session lifecycle misuse, e.g. recording a query on an ended
    /// session.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller provided malformed input (empty name, non-positive
    /// `max_results`, invalid glob pattern).
    #[error("validation: {0}")]
    Validation(String),

    /// Serialization/deserialization failed in the service layer.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying the call).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Storage(StorageError::NotFound { .. }))
    }

    /// Whether this error is a uniqueness conflict on create.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_conflict())
    }

    /// Whether this error is a stale-version failure. The only kind a
    /// caller should re-read and retry, under a bounded attempt count.
    #[must_use]
    pub const fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_version_conflict())
    }
}
