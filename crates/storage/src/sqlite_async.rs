//! Async trait implementations for SQLite `Storage` via `spawn_blocking`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ucl_core::{
    AiSession, ContextQuery, ContextResponse, DomainContext, GlobalContext, PlatformContext,
    ProjectContext,
};

use crate::Storage;
use crate::error::StorageError;
use crate::traits::{AuditStore, ContextStore, SessionStore};
use crate::types::StorageStats;

/// Helper: run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Unavailable(format!("spawn_blocking join error: {e}")))?
}

/// Body-generating macro for async-to-blocking delegation.
///
/// Each argument is annotated with a capture kind:
/// - `@ref arg` — `.clone()` a `&T`, pass as `&arg`
/// - `@str arg` — `.to_owned()` a `&str`, pass as `&arg`
/// - `@val arg` — move directly (Copy/owned types)
macro_rules! delegate {
    ($self:ident, $method:ident $(, @$kind:ident $arg:ident)*) => {{
        let s = $self.clone();
        $(delegate!(@capture $kind $arg);)*
        blocking(move || s.$method($(delegate!(@pass $kind $arg)),*)).await
    }};
    (@capture ref $arg:ident) => { let $arg = $arg.clone(); };
    (@capture str $arg:ident) => { let $arg = $arg.to_owned(); };
    (@capture val $arg:ident) => { };
    (@pass ref $arg:ident) => { &$arg };
    (@pass str $arg:ident) => { &$arg };
    (@pass val $arg:ident) => { $arg };
}

// ── ContextStore ─────────────────────────────────────────────────

#[async_trait]
impl ContextStore for Storage {
    async fn create_project(
        &self,
        project: &ProjectContext,
    ) -> Result<ProjectContext, StorageError> {
        delegate!(self, create_project, @ref project)
    }
    async fn get_project(&self, id: &str) -> Result<Option<ProjectContext>, StorageError> {
        delegate!(self, get_project, @str id)
    }
    async fn list_projects(&self) -> Result<Vec<ProjectContext>, StorageError> {
        delegate!(self, list_projects)
    }
    async fn update_project(
        &self,
        project: &ProjectContext,
        expected_version: i64,
    ) -> Result<ProjectContext, StorageError> {
        delegate!(self, update_project, @ref project, @val expected_version)
    }
    async fn delete_project(&self, id: &str) -> Result<bool, StorageError> {
        delegate!(self, delete_project, @str id)
    }
    async fn create_global_context(
        &self,
        ctx: &GlobalContext,
    ) -> Result<GlobalContext, StorageError> {
        delegate!(self, create_global_context, @ref ctx)
    }
    async fn get_global_context(
        &self,
        project_id: &str,
    ) -> Result<Option<GlobalContext>, StorageError> {
        delegate!(self, get_global_context, @str project_id)
    }
    async fn update_global_context(
        &self,
        ctx: &GlobalContext,
        expected_version: i64,
    ) -> Result<GlobalContext, StorageError> {
        delegate!(self, update_global_context, @ref ctx, @val expected_version)
    }
    async fn create_platform_context(
        &self,
        ctx: &PlatformContext,
    ) -> Result<PlatformContext, StorageError> {
        delegate!(self, create_platform_context, @ref ctx)
    }
    async fn get_platform_context(
        &self,
        project_id: &str,
        platform_type: &str,
    ) -> Result<Option<PlatformContext>, StorageError> {
        delegate!(self, get_platform_context, @str project_id, @str platform_type)
    }
    async fn get_platform_context_by_id(
        &self,
        id: &str,
    ) -> Result<Option<PlatformContext>, StorageError> {
        delegate!(self, get_platform_context_by_id, @str id)
    }
    async fn list_platform_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<PlatformContext>, StorageError> {
        delegate!(self, list_platform_contexts, @str project_id)
    }
    async fn update_platform_context(
        &self,
        ctx: &PlatformContext,
        expected_version: i64,
    ) -> Result<PlatformContext, StorageError> {
        delegate!(self, update_platform_context, @ref ctx, @val expected_version)
    }
    async fn create_domain_context(
        &self,
        ctx: &DomainContext,
    ) -> Result<DomainContext, StorageError> {
        delegate!(self, create_domain_context, @ref ctx)
    }
    async fn get_domain_context(
        &self,
        project_id: &str,
        domain_type: &str,
    ) -> Result<Option<DomainContext>, StorageError> {
        delegate!(self, get_domain_context, @str project_id, @str domain_type)
    }
    async fn list_domain_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<DomainContext>, StorageError> {
        delegate!(self, list_domain_contexts, @str project_id)
    }
    async fn update_domain_context(
        &self,
        ctx: &DomainContext,
        expected_version: i64,
    ) -> Result<DomainContext, StorageError> {
        delegate!(self, update_domain_context, @ref ctx, @val expected_version)
    }
    async fn get_stats(&self) -> Result<StorageStats, StorageError> {
        delegate!(self, get_stats)
    }
}

// ── SessionStore ─────────────────────────────────────────────────

#[async_trait]
impl SessionStore for Storage {
    async fn create_session(&self, session: &AiSession) -> Result<AiSession, StorageError> {
        delegate!(self, create_session, @ref session)
    }
    async fn get_session(&self, id: &str) -> Result<Option<AiSession>, StorageError> {
        delegate!(self, get_session, @str id)
    }
    async fn update_session(
        &self,
        session: &AiSession,
        expected_version: i64,
    ) -> Result<AiSession, StorageError> {
        delegate!(self, update_session, @ref session, @val expected_version)
    }
    async fn sessions_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<AiSession>, StorageError> {
        delegate!(self, sessions_for_project, @str project_id)
    }
    async fn sessions_started_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<AiSession>, StorageError> {
        delegate!(self, sessions_started_since, @str project_id, @val since)
    }
    async fn close_stale_sessions(&self, max_age_hours: i64) -> Result<usize, StorageError> {
        delegate!(self, close_stale_sessions, @val max_age_hours)
    }
    async fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        delegate!(self, delete_session, @str id)
    }
}

// ── AuditStore ───────────────────────────────────────────────────

#[async_trait]
impl AuditStore for Storage {
    async fn save_query(&self, query: &ContextQuery) -> Result<(), StorageError> {
        delegate!(self, save_query, @ref query)
    }
    async fn save_response(&self, response: &ContextResponse) -> Result<(), StorageError> {
        delegate!(self, save_response, @ref response)
    }
    async fn query_history(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextQuery>, StorageError> {
        delegate!(self, query_history, @str session_id, @val limit)
    }
    async fn popular_queries(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, u64)>, StorageError> {
        delegate!(self, popular_queries, @str project_id, @val since, @val limit)
    }
    async fn count_queries_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        delegate!(self, count_queries_since, @str project_id, @val since)
    }
}
