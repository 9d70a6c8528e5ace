use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ucl_core::AiSession;

use crate::error::StorageError;

/// AI session lifecycle records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a newly started session.
    async fn create_session(&self, session: &AiSession) -> Result<AiSession, StorageError>;

    /// Get a session by id.
    async fn get_session(&self, id: &str) -> Result<Option<AiSession>, StorageError>;

    /// Versioned session update — the same optimistic path contexts use,
    /// so concurrent activity recording never loses increments.
    async fn update_session(
        &self,
        session: &AiSession,
        expected_version: i64,
    ) -> Result<AiSession, StorageError>;

    /// All sessions of a project, newest first.
    async fn sessions_for_project(&self, project_id: &str)
    -> Result<Vec<AiSession>, StorageError>;

    /// Sessions started at or after `since`, newest first.
    async fn sessions_started_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<AiSession>, StorageError>;

    /// End every active session idle longer than `max_age_hours`.
    /// Called by an external sweeper, never scheduled here.
    async fn close_stale_sessions(&self, max_age_hours: i64) -> Result<usize, StorageError>;

    /// Retention-purge hook. Returns `true` if a row was deleted.
    async fn delete_session(&self, id: &str) -> Result<bool, StorageError>;
}
