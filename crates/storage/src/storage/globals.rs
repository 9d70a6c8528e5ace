use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row, params};
use ucl_core::{GlobalContext, Tier};

use super::{Storage, get_conn, parse_json, parse_ts, to_json};
use crate::error::StorageError;
use crate::events::{ChangeEvent, ChangeKind};

const SELECT_COLUMNS: &str = "id, project_id, shared_knowledge, shared_conventions, \
                              shared_resources, common_patterns, cross_platform_insights, \
                              last_updated, version, created_at";

impl Storage {
    /// Create the global context for a project and back-link it on the
    /// project row.
    ///
    /// # Errors
    /// `Conflict` when the project already has an active global context.
    pub(crate) fn create_global_context(
        &self,
        ctx: &GlobalContext,
    ) -> Result<GlobalContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO global_contexts
               (id, project_id, shared_knowledge, shared_conventions, shared_resources,
                common_patterns, cross_platform_insights, last_updated, version, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                ctx.id,
                ctx.project_id,
                to_json(&ctx.shared_knowledge)?,
                to_json(&ctx.shared_conventions)?,
                to_json(&ctx.shared_resources)?,
                to_json(&ctx.common_patterns)?,
                to_json(&ctx.cross_platform_insights)?,
                ctx.last_updated.to_rfc3339(),
                ctx.version,
                ctx.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| match StorageError::from(e) {
            StorageError::Conflict(_) => StorageError::Conflict(format!(
                "project {} already has a global context",
                ctx.project_id
            )),
            other => other,
        })?;
        conn.execute(
            "UPDATE project_contexts SET global_context_id = ?1 WHERE id = ?2",
            params![ctx.id, ctx.project_id],
        )?;
        self.emit(ChangeEvent::new(
            ChangeKind::Created,
            Tier::Global,
            &ctx.id,
            &ctx.project_id,
            ctx.version,
        ));
        Ok(ctx.clone())
    }

    /// The one active global context of a project, if created.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_global_context(
        &self,
        project_id: &str,
    ) -> Result<Option<GlobalContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let result = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM global_contexts WHERE project_id = ?1"),
                params![project_id],
                row_to_global,
            )
            .optional()?;
        Ok(result)
    }

    /// Optimistic update; see [`Storage::update_project`] for the contract.
    ///
    /// # Errors
    /// `VersionConflict` when stale, `NotFound` when the row is gone.
    pub(crate) fn update_global_context(
        &self,
        ctx: &GlobalContext,
        expected_version: i64,
    ) -> Result<GlobalContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now();
        let affected = conn.execute(
            "UPDATE global_contexts
               SET shared_knowledge = ?1, shared_conventions = ?2, shared_resources = ?3,
                   common_patterns = ?4, cross_platform_insights = ?5,
                   last_updated = ?6, version = ?7
               WHERE id = ?8 AND version = ?9",
            params![
                to_json(&ctx.shared_knowledge)?,
                to_json(&ctx.shared_conventions)?,
                to_json(&ctx.shared_resources)?,
                to_json(&ctx.common_patterns)?,
                to_json(&ctx.cross_platform_insights)?,
                now.to_rfc3339(),
                expected_version + 1,
                ctx.id,
                expected_version,
            ],
        )?;
        if affected == 0 {
            return Err(self.version_conflict_or_not_found(
                &conn,
                "global_contexts",
                "global_context",
                &ctx.id,
                expected_version,
            ));
        }
        let mut updated = ctx.clone();
        updated.version = expected_version + 1;
        updated.last_updated = now;
        self.emit(ChangeEvent::new(
            ChangeKind::Updated,
            Tier::Global,
            &updated.id,
            &updated.project_id,
            updated.version,
        ));
        Ok(updated)
    }
}

fn row_to_global(row: &Row<'_>) -> rusqlite::Result<GlobalContext> {
    Ok(GlobalContext {
        id: row.get(0)?,
        project_id: row.get(1)?,
        shared_knowledge: parse_json(&row.get::<_, String>(2)?)?,
        shared_conventions: parse_json(&row.get::<_, String>(3)?)?,
        shared_resources: parse_json(&row.get::<_, String>(4)?)?,
        common_patterns: parse_json(&row.get::<_, String>(5)?)?,
        cross_platform_insights: parse_json(&row.get::<_, String>(6)?)?,
        last_updated: parse_ts(&row.get::<_, String>(7)?)?,
        version: row.get(8)?,
        created_at: parse_ts(&row.get::<_, String>(9)?)?,
    })
}
