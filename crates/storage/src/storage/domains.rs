use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row, params};
use ucl_core::{DomainContext, Tier};

use super::{Storage, get_conn, log_row_error, parse_json, parse_ts, to_json};
use crate::error::StorageError;
use crate::events::{ChangeEvent, ChangeKind};

const SELECT_COLUMNS: &str = "id, project_id, domain_type, technologies, file_patterns, \
                              key_files, apis, dependencies, conventions, metadata, \
                              last_updated, version, created_at";

impl Storage {
    /// Create a domain context.
    ///
    /// # Errors
    /// `Conflict` when `(project_id, domain_type)` already exists.
    pub(crate) fn create_domain_context(
        &self,
        ctx: &DomainContext,
    ) -> Result<DomainContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO domain_contexts
               (id, project_id, domain_type, technologies, file_patterns, key_files, apis,
                dependencies, conventions, metadata, last_updated, version, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                ctx.id,
                ctx.project_id,
                ctx.domain_type,
                to_json(&ctx.technologies)?,
                to_json(&ctx.file_patterns)?,
                to_json(&ctx.key_files)?,
                to_json(&ctx.apis)?,
                to_json(&ctx.dependencies)?,
                to_json(&ctx.conventions)?,
                to_json(&ctx.metadata)?,
                ctx.last_updated.to_rfc3339(),
                ctx.version,
                ctx.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| match StorageError::from(e) {
            StorageError::Conflict(_) => StorageError::Conflict(format!(
                "domain context already exists: ({}, {})",
                ctx.project_id, ctx.domain_type
            )),
            other => other,
        })?;
        self.emit(ChangeEvent::new(
            ChangeKind::Created,
            Tier::Domain,
            &ctx.id,
            &ctx.project_id,
            ctx.version,
        ));
        Ok(ctx.clone())
    }

    /// Get a domain context by its unique `(project_id, domain_type)`.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_domain_context(
        &self,
        project_id: &str,
        domain_type: &str,
    ) -> Result<Option<DomainContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM domain_contexts
                       WHERE project_id = ?1 AND domain_type = ?2"
                ),
                params![project_id, domain_type],
                row_to_domain,
            )
            .optional()?;
        Ok(result)
    }

    /// All domain contexts of a project, ordered by domain type.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn list_domain_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<DomainContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM domain_contexts
               WHERE project_id = ?1 ORDER BY domain_type"
        ))?;
        let results =
            stmt.query_map(params![project_id], row_to_domain)?.filter_map(log_row_error).collect();
        Ok(results)
    }

    /// Optimistic update; see [`Storage::update_project`] for the contract.
    ///
    /// # Errors
    /// `VersionConflict` when stale, `NotFound` when the row is gone.
    pub(crate) fn update_domain_context(
        &self,
        ctx: &DomainContext,
        expected_version: i64,
    ) -> Result<DomainContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now();
        let affected = conn.execute(
            "UPDATE domain_contexts
               SET technologies = ?1, file_patterns = ?2, key_files = ?3, apis = ?4,
                   dependencies = ?5, conventions = ?6, metadata = ?7,
                   last_updated = ?8, version = ?9
               WHERE id = ?10 AND version = ?11",
            params![
                to_json(&ctx.technologies)?,
                to_json(&ctx.file_patterns)?,
                to_json(&ctx.key_files)?,
                to_json(&ctx.apis)?,
                to_json(&ctx.dependencies)?,
                to_json(&ctx.conventions)?,
                to_json(&ctx.metadata)?,
                now.to_rfc3339(),
                expected_version + 1,
                ctx.id,
                expected_version,
            ],
        )?;
        if affected == 0 {
            return Err(self.version_conflict_or_not_found(
                &conn,
                "domain_contexts",
                "domain_context",
                &ctx.id,
                expected_version,
            ));
        }
        let mut updated = ctx.clone();
        updated.version = expected_version + 1;
        updated.last_updated = now;
        self.emit(ChangeEvent::new(
            ChangeKind::Updated,
            Tier::Domain,
            &updated.id,
            &updated.project_id,
            updated.version,
        ));
        Ok(updated)
    }
}

fn row_to_domain(row: &Row<'_>) -> rusqlite::Result<DomainContext> {
    Ok(DomainContext {
        id: row.get(0)?,
        project_id: row.get(1)?,
        domain_type: row.get(2)?,
        technologies: parse_json(&row.get::<_, String>(3)?)?,
        file_patterns: parse_json(&row.get::<_, String>(4)?)?,
        key_files: parse_json(&row.get::<_, String>(5)?)?,
        apis: parse_json(&row.get::<_, String>(6)?)?,
        dependencies: parse_json(&row.get::<_, String>(7)?)?,
        conventions: parse_json(&row.get::<_, String>(8)?)?,
        metadata: parse_json(&row.get::<_, String>(9)?)?,
        last_updated: parse_ts(&row.get::<_, String>(10)?)?,
        version: row.get(11)?,
        created_at: parse_ts(&row.get::<_, String>(12)?)?,
    })
}
