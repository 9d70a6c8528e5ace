//! Context tier management: creates and versioned merge-updates.
//!
//! Every mutation passes through the merge resolver before the single
//! atomic versioned write. A stale `expected_version` aborts before any
//! merge happens and is never silently re-merged against a newer
//! version; re-fetch-and-retry belongs to the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use ucl_core::merge::{
    DomainContextPatch, GlobalContextPatch, MutationKind, PlatformContextPatch,
    ProjectContextPatch, merge_domain, merge_global, merge_platform, merge_project,
    replace_domain, replace_global, replace_platform, replace_project,
};
use ucl_core::{DomainContext, GlobalContext, PlatformContext, ProjectContext};
use ucl_storage::traits::ContextStore;
use ucl_storage::{Storage, StorageError, StorageStats};

use crate::ServiceError;

pub struct ContextService {
    storage: Arc<Storage>,
}

impl ContextService {
    #[must_use]
    pub const fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    // ── Project tier ─────────────────────────────────────────────

    pub async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        repository_url: Option<&str>,
        technologies: BTreeSet<String>,
    ) -> Result<ProjectContext, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("project name must be non-empty".to_owned()));
        }
        let mut project = ProjectContext::new(name);
        project.description = description.map(ToOwned::to_owned);
        project.repository_url = repository_url.map(ToOwned::to_owned);
        project.technologies = technologies;
        Ok(self.storage.create_project(&project).await?)
    }

    pub async fn get_project(&self, id: &str) -> Result<Option<ProjectContext>, ServiceError> {
        Ok(self.storage.get_project(id).await?)
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectContext>, ServiceError> {
        Ok(self.storage.list_projects().await?)
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        patch: &ProjectContextPatch,
        expected_version: i64,
        kind: MutationKind,
    ) -> Result<ProjectContext, ServiceError> {
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(ServiceError::Validation("project name must be non-empty".to_owned()));
        }
        let current = self
            .storage
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))?;
        check_version("project", &current.id, current.version, expected_version)?;
        let merged = match kind {
            MutationKind::Merge => merge_project(&current, patch),
            MutationKind::Replace => replace_project(&current, patch),
        };
        Ok(self.storage.update_project(&merged, expected_version).await?)
    }

    /// Delete the aggregate root; the store cascades to every owned
    /// context, session, and audit record.
    pub async fn delete_project(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(self.storage.delete_project(id).await?)
    }

    // ── Global tier ──────────────────────────────────────────────

    pub async fn create_global_context(
        &self,
        project_id: &str,
        initial: &GlobalContextPatch,
    ) -> Result<GlobalContext, ServiceError> {
        self.require_project(project_id).await?;
        let ctx = replace_global(&GlobalContext::new(project_id), initial);
        Ok(self.storage.create_global_context(&ctx).await?)
    }

    pub async fn get_global_context(
        &self,
        project_id: &str,
    ) -> Result<Option<GlobalContext>, ServiceError> {
        Ok(self.storage.get_global_context(project_id).await?)
    }

    pub async fn update_global_context(
        &self,
        project_id: &str,
        patch: &GlobalContextPatch,
        expected_version: i64,
        kind: MutationKind,
    ) -> Result<GlobalContext, ServiceError> {
        let current = self
            .storage
            .get_global_context(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("global context of {project_id}")))?;
        check_version("global_context", &current.id, current.version, expected_version)?;
        let merged = match kind {
            MutationKind::Merge => merge_global(&current, patch),
            MutationKind::Replace => replace_global(&current, patch),
        };
        Ok(self.storage.update_global_context(&merged, expected_version).await?)
    }

    // ── Platform tier ────────────────────────────────────────────

    /// Create a platform context, linked to the project's global context
    /// when one exists (the authoritative linkage direction).
    pub async fn create_platform_context(
        &self,
        project_id: &str,
        platform_type: &str,
        initial: &PlatformContextPatch,
    ) -> Result<PlatformContext, ServiceError> {
        if platform_type.trim().is_empty() {
            return Err(ServiceError::Validation("platform_type must be non-empty".to_owned()));
        }
        self.require_project(project_id).await?;
        let mut ctx =
            replace_platform(&PlatformContext::new(project_id, platform_type), initial);
        ctx.global_context_id =
            self.storage.get_global_context(project_id).await?.map(|g| g.id);
        Ok(self.storage.create_platform_context(&ctx).await?)
    }

    pub async fn get_platform_context(
        &self,
        project_id: &str,
        platform_type: &str,
    ) -> Result<Option<PlatformContext>, ServiceError> {
        Ok(self.storage.get_platform_context(project_id, platform_type).await?)
    }

    pub async fn list_platform_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<PlatformContext>, ServiceError> {
        Ok(self.storage.list_platform_contexts(project_id).await?)
    }

    pub async fn update_platform_context(
        &self,
        project_id: &str,
        platform_type: &str,
        patch: &PlatformContextPatch,
        expected_version: i64,
        kind: MutationKind,
    ) -> Result<PlatformContext, ServiceError> {
        let current =
            self.storage.get_platform_context(project_id, platform_type).await?.ok_or_else(
                || ServiceError::NotFound(format!("platform ({project_id}, {platform_type})")),
            )?;
        check_version("platform_context", &current.id, current.version, expected_version)?;
        let merged = match kind {
            MutationKind::Merge => merge_platform(&current, patch),
            MutationKind::Replace => replace_platform(&current, patch),
        };
        Ok(self.storage.update_platform_context(&merged, expected_version).await?)
    }

    // ── Domain tier ──────────────────────────────────────────────

    pub async fn create_domain_context(
        &self,
        project_id: &str,
        domain_type: &str,
        initial: &DomainContextPatch,
    ) -> Result<DomainContext, ServiceError> {
        if domain_type.trim().is_empty() {
            return Err(ServiceError::Validation("domain_type must be non-empty".to_owned()));
        }
        validate_file_patterns(&initial.file_patterns)?;
        self.require_project(project_id).await?;
        let ctx = replace_domain(&DomainContext::new(project_id, domain_type), initial);
        Ok(self.storage.create_domain_context(&ctx).await?)
    }

    pub async fn get_domain_context(
        &self,
        project_id: &str,
        domain_type: &str,
    ) -> Result<Option<DomainContext>, ServiceError> {
        Ok(self.storage.get_domain_context(project_id, domain_type).await?)
    }

    pub async fn list_domain_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<DomainContext>, ServiceError> {
        Ok(self.storage.list_domain_contexts(project_id).await?)
    }

    pub async fn update_domain_context(
        &self,
        project_id: &str,
        domain_type: &str,
        patch: &DomainContextPatch,
        expected_version: i64,
        kind: MutationKind,
    ) -> Result<DomainContext, ServiceError> {
        validate_file_patterns(&patch.file_patterns)?;
        let current =
            self.storage.get_domain_context(project_id, domain_type).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("domain ({project_id}, {domain_type})"))
            })?;
        check_version("domain_context", &current.id, current.version, expected_version)?;
        let merged = match kind {
            MutationKind::Merge => merge_domain(&current, patch),
            MutationKind::Replace => replace_domain(&current, patch),
        };
        Ok(self.storage.update_domain_context(&merged, expected_version).await?)
    }

    // ── Stats ────────────────────────────────────────────────────

    pub async fn get_stats(&self) -> Result<StorageStats, ServiceError> {
        Ok(self.storage.get_stats().await?)
    }

    async fn require_project(&self, project_id: &str) -> Result<ProjectContext, ServiceError> {
        self.storage
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))
    }
}

/// Resolver staleness check: abort before merging, surface the same
/// conflict the atomic UPDATE would.
fn check_version(
    entity: &'static str,
    id: &str,
    actual: i64,
    expected: i64,
) -> Result<(), ServiceError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ServiceError::Storage(StorageError::VersionConflict {
            entity,
            id: id.to_owned(),
            expected,
            actual,
        }))
    }
}

/// Shape validation at the store boundary: every file pattern must be a
/// valid glob.
fn validate_file_patterns(patterns: &BTreeSet<String>) -> Result<(), ServiceError> {
    for pattern in patterns {
        globset::Glob::new(pattern)
            .map_err(|e| ServiceError::Validation(format!("invalid file pattern: {e}")))?;
    }
    Ok(())
}
