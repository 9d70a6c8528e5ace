//! AI session lifecycle: `Created → Active → Ended`.
//!
//! The tracker owns session records, so it retries stale-version writes
//! internally (bounded); context mutations leave retrying to their
//! callers instead.

use std::collections::BTreeSet;
use std::sync::Arc;

use ucl_core::constants::MAX_VERSION_RETRIES;
use ucl_core::{AiSession, JsonMap};
use ucl_storage::traits::{ContextStore, SessionStore};
use ucl_storage::{Storage, StorageError};

use crate::ServiceError;

pub struct SessionService {
    storage: Arc<Storage>,
}

impl SessionService {
    #[must_use]
    pub const fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Start a session in `Active` state, counters zeroed.
    pub async fn start_session(
        &self,
        project_id: &str,
        ai_type: &str,
        ai_instance_id: Option<&str>,
        platform_context_id: Option<&str>,
        metadata: JsonMap,
    ) -> Result<AiSession, ServiceError> {
        if ai_type.trim().is_empty() {
            return Err(ServiceError::Validation("ai_type must be non-empty".to_owned()));
        }
        self.storage
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))?;
        if let Some(platform_id) = platform_context_id
            && self.storage.get_platform_context_by_id(platform_id).await?.is_none()
        {
            return Err(ServiceError::NotFound(format!("platform context {platform_id}")));
        }

        let mut session = AiSession::start(project_id, ai_type);
        session.ai_instance_id = ai_instance_id.map(ToOwned::to_owned);
        session.platform_context_id = platform_context_id.map(ToOwned::to_owned);
        session.metadata = metadata;
        let session = self.storage.create_session(&session).await?;
        tracing::debug!(session_id = %session.id, ai_type, "session started");
        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<AiSession>, ServiceError> {
        Ok(self.storage.get_session(id).await?)
    }

    /// Record one query against an `Active` session: bumps the counter,
    /// unions accessed domains, remembers the query text and context
    /// fingerprint, and stickies `accessed_global_context`.
    ///
    /// # Errors
    /// `InvalidState` when the session has ended; `NotFound` when it
    /// does not exist.
    pub async fn record_query(
        &self,
        session_id: &str,
        domains_filter: &BTreeSet<String>,
        query_text: &str,
        touched_global: bool,
        context_hash: Option<&str>,
    ) -> Result<AiSession, ServiceError> {
        self.update_active(session_id, |session| {
            session.queries_count += 1;
            session.domains_accessed.extend(domains_filter.iter().cloned());
            session.last_query = Some(query_text.to_owned());
            if touched_global {
                session.accessed_global_context = true;
            }
            if let Some(hash) = context_hash {
                session.context_hash = Some(hash.to_owned());
            }
        })
        .await
    }

    /// End an `Active` session.
    ///
    /// # Errors
    /// `InvalidState` when already ended.
    pub async fn end_session(&self, session_id: &str) -> Result<AiSession, ServiceError> {
        let ended = self
            .update_active(session_id, |session| {
                session.session_end = Some(chrono::Utc::now());
            })
            .await?;
        tracing::debug!(session_id, queries = ended.queries_count, "session ended");
        Ok(ended)
    }

    /// Hook for an external idle-timeout sweeper.
    pub async fn close_stale_sessions(&self, max_age_hours: i64) -> Result<usize, ServiceError> {
        Ok(self.storage.close_stale_sessions(max_age_hours).await?)
    }

    /// Retention-purge hook; audit records are otherwise never deleted.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool, ServiceError> {
        Ok(self.storage.delete_session(session_id).await?)
    }

    /// Fetch-mutate-write with the versioned update path, retrying a
    /// bounded number of times when a concurrent writer got there first.
    async fn update_active(
        &self,
        session_id: &str,
        mutate: impl Fn(&mut AiSession),
    ) -> Result<AiSession, ServiceError> {
        let mut last_conflict: Option<StorageError> = None;
        for attempt in 0..MAX_VERSION_RETRIES {
            let mut session = self
                .storage
                .get_session(session_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))?;
            if !session.is_active() {
                return Err(ServiceError::InvalidState(format!(
                    "session {session_id} has already ended"
                )));
            }
            let expected = session.version;
            mutate(&mut session);
            match self.storage.update_session(&session, expected).await {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_version_conflict() => {
                    tracing::debug!(session_id, attempt, "session update raced, re-reading");
                    last_conflict = Some(e);
                },
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_conflict
            .map_or_else(
                || {
                    ServiceError::InvalidState(format!(
                        "session {session_id} update retries exhausted"
                    ))
                },
                ServiceError::Storage,
            ))
    }
}
