use async_trait::async_trait;
use ucl_core::{DomainContext, GlobalContext, PlatformContext, ProjectContext};

use crate::error::StorageError;
use crate::types::StorageStats;

/// Durable keyed storage for the four context tiers.
///
/// Every `update_*` is an optimistic write: it succeeds only when the
/// stored version equals `expected_version`, then bumps the version by
/// exactly 1 and stamps `last_updated`. Every successful create/update
/// emits a change event (fire-and-forget).
#[async_trait]
pub trait ContextStore: Send + Sync {
    // ── Project tier ─────────────────────────────────────────────

    /// Create a project. `Conflict` when the name is taken.
    async fn create_project(
        &self,
        project: &ProjectContext,
    ) -> Result<ProjectContext, StorageError>;

    /// Get a project by id.
    async fn get_project(&self, id: &str) -> Result<Option<ProjectContext>, StorageError>;

    /// All projects, most recently updated first.
    async fn list_projects(&self) -> Result<Vec<ProjectContext>, StorageError>;

    /// Versioned project update.
    async fn update_project(
        &self,
        project: &ProjectContext,
        expected_version: i64,
    ) -> Result<ProjectContext, StorageError>;

    /// Delete a project and (via store-level cascade) everything it owns.
    async fn delete_project(&self, id: &str) -> Result<bool, StorageError>;

    // ── Global tier ──────────────────────────────────────────────

    /// Create the single global context of a project.
    /// `Conflict` when one already exists.
    async fn create_global_context(
        &self,
        ctx: &GlobalContext,
    ) -> Result<GlobalContext, StorageError>;

    /// The project's global context, if created.
    async fn get_global_context(
        &self,
        project_id: &str,
    ) -> Result<Option<GlobalContext>, StorageError>;

    /// Versioned global context update.
    async fn update_global_context(
        &self,
        ctx: &GlobalContext,
        expected_version: i64,
    ) -> Result<GlobalContext, StorageError>;

    // ── Platform tier ────────────────────────────────────────────

    /// Create a platform context. `Conflict` on a colliding
    /// `(project_id, platform_type)`.
    async fn create_platform_context(
        &self,
        ctx: &PlatformContext,
    ) -> Result<PlatformContext, StorageError>;

    /// Get by the unique `(project_id, platform_type)` pair.
    async fn get_platform_context(
        &self,
        project_id: &str,
        platform_type: &str,
    ) -> Result<Option<PlatformContext>, StorageError>;

    /// Get by id.
    async fn get_platform_context_by_id(
        &self,
        id: &str,
    ) -> Result<Option<PlatformContext>, StorageError>;

    /// All platform contexts of a project.
    async fn list_platform_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<PlatformContext>, StorageError>;

    /// Versioned platform context update.
    async fn update_platform_context(
        &self,
        ctx: &PlatformContext,
        expected_version: i64,
    ) -> Result<PlatformContext, StorageError>;

    // ── Domain tier ──────────────────────────────────────────────

    /// Create a domain context. `Conflict` on a colliding
    /// `(project_id, domain_type)`.
    async fn create_domain_context(
        &self,
        ctx: &DomainContext,
    ) -> Result<DomainContext, StorageError>;

    /// Get by the unique `(project_id, domain_type)` pair.
    async fn get_domain_context(
        &self,
        project_id: &str,
        domain_type: &str,
    ) -> Result<Option<DomainContext>, StorageError>;

    /// All domain contexts of a project.
    async fn list_domain_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<DomainContext>, StorageError>;

    /// Versioned domain context update.
    async fn update_domain_context(
        &self,
        ctx: &DomainContext,
        expected_version: i64,
    ) -> Result<DomainContext, StorageError>;

    // ── Stats ────────────────────────────────────────────────────

    /// Row counts across every table.
    async fn get_stats(&self) -> Result<StorageStats, StorageError>;
}
