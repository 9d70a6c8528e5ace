use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row, params};
use ucl_core::{PlatformContext, Tier};

use super::{Storage, get_conn, log_row_error, parse_json, parse_ts, to_json};
use crate::error::StorageError;
use crate::events::{ChangeEvent, ChangeKind};

const SELECT_COLUMNS: &str = "id, project_id, global_context_id, platform_type, \
                              platform_specific_data, learned_preferences, interaction_history, \
                              custom_prompts, platform_conventions, performance_metrics, \
                              last_updated, version, created_at";

impl Storage {
    /// Create a platform context and refresh the project's cached
    /// platform list (derived view; the FK on this row is authoritative).
    ///
    /// # Errors
    /// `Conflict` when `(project_id, platform_type)` already exists.
    pub(crate) fn create_platform_context(
        &self,
        ctx: &PlatformContext,
    ) -> Result<PlatformContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO platform_contexts
               (id, project_id, global_context_id, platform_type, platform_specific_data,
                learned_preferences, interaction_history, custom_prompts, platform_conventions,
                performance_metrics, last_updated, version, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                ctx.id,
                ctx.project_id,
                ctx.global_context_id,
                ctx.platform_type,
                to_json(&ctx.platform_specific_data)?,
                to_json(&ctx.learned_preferences)?,
                to_json(&ctx.interaction_history)?,
                to_json(&ctx.custom_prompts)?,
                to_json(&ctx.platform_conventions)?,
                to_json(&ctx.performance_metrics)?,
                ctx.last_updated.to_rfc3339(),
                ctx.version,
                ctx.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| match StorageError::from(e) {
            StorageError::Conflict(_) => StorageError::Conflict(format!(
                "platform context already exists: ({}, {})",
                ctx.project_id, ctx.platform_type
            )),
            other => other,
        })?;
        self.refresh_platform_cache(&conn, &ctx.project_id)?;
        self.emit(ChangeEvent::new(
            ChangeKind::Created,
            Tier::Platform,
            &ctx.id,
            &ctx.project_id,
            ctx.version,
        ));
        Ok(ctx.clone())
    }

    /// Get a platform context by its unique `(project_id, platform_type)`.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_platform_context(
        &self,
        project_id: &str,
        platform_type: &str,
    ) -> Result<Option<PlatformContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM platform_contexts
                       WHERE project_id = ?1 AND platform_type = ?2"
                ),
                params![project_id, platform_type],
                row_to_platform,
            )
            .optional()?;
        Ok(result)
    }

    /// Get a platform context by id.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_platform_context_by_id(
        &self,
        id: &str,
    ) -> Result<Option<PlatformContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let result = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM platform_contexts WHERE id = ?1"),
                params![id],
                row_to_platform,
            )
            .optional()?;
        Ok(result)
    }

    /// All platform contexts of a project, ordered by platform type.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn list_platform_contexts(
        &self,
        project_id: &str,
    ) -> Result<Vec<PlatformContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM platform_contexts
               WHERE project_id = ?1 ORDER BY platform_type"
        ))?;
        let results =
            stmt.query_map(params![project_id], row_to_platform)?.filter_map(log_row_error).collect();
        Ok(results)
    }

    /// Optimistic update; see [`Storage::update_project`] for the contract.
    ///
    /// # Errors
    /// `VersionConflict` when stale, `NotFound` when the row is gone.
    pub(crate) fn update_platform_context(
        &self,
        ctx: &PlatformContext,
        expected_version: i64,
    ) -> Result<PlatformContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now();
        let affected = conn.execute(
            "UPDATE platform_contexts
               SET global_context_id = ?1, platform_specific_data = ?2, learned_preferences = ?3,
                   interaction_history = ?4, custom_prompts = ?5, platform_conventions = ?6,
                   performance_metrics = ?7, last_updated = ?8, version = ?9
               WHERE id = ?10 AND version = ?11",
            params![
                ctx.global_context_id,
                to_json(&ctx.platform_specific_data)?,
                to_json(&ctx.learned_preferences)?,
                to_json(&ctx.interaction_history)?,
                to_json(&ctx.custom_prompts)?,
                to_json(&ctx.platform_conventions)?,
                to_json(&ctx.performance_metrics)?,
                now.to_rfc3339(),
                expected_version + 1,
                ctx.id,
                expected_version,
            ],
        )?;
        if affected == 0 {
            return Err(self.version_conflict_or_not_found(
                &conn,
                "platform_contexts",
                "platform_context",
                &ctx.id,
                expected_version,
            ));
        }
        let mut updated = ctx.clone();
        updated.version = expected_version + 1;
        updated.last_updated = now;
        self.emit(ChangeEvent::new(
            ChangeKind::Updated,
            Tier::Platform,
            &updated.id,
            &updated.project_id,
            updated.version,
        ));
        Ok(updated)
    }

    /// Rewrite the project's cached platform id list from the
    /// authoritative platform rows.
    fn refresh_platform_cache(
        &self,
        conn: &rusqlite::Connection,
        project_id: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(
            "SELECT id FROM platform_contexts WHERE project_id = ?1 ORDER BY platform_type",
        )?;
        let ids: Vec<String> =
            stmt.query_map(params![project_id], |row| row.get(0))?.filter_map(log_row_error).collect();
        conn.execute(
            "UPDATE project_contexts SET platform_contexts = ?1 WHERE id = ?2",
            params![to_json(&ids)?, project_id],
        )?;
        Ok(())
    }
}

fn row_to_platform(row: &Row<'_>) -> rusqlite::Result<PlatformContext> {
    Ok(PlatformContext {
        id: row.get(0)?,
        project_id: row.get(1)?,
        global_context_id: row.get(2)?,
        platform_type: row.get(3)?,
        platform_specific_data: parse_json(&row.get::<_, String>(4)?)?,
        learned_preferences: parse_json(&row.get::<_, String>(5)?)?,
        interaction_history: parse_json(&row.get::<_, String>(6)?)?,
        custom_prompts: parse_json(&row.get::<_, String>(7)?)?,
        platform_conventions: parse_json(&row.get::<_, String>(8)?)?,
        performance_metrics: parse_json(&row.get::<_, String>(9)?)?,
        last_updated: parse_ts(&row.get::<_, String>(10)?)?,
        version: row.get(11)?,
        created_at: parse_ts(&row.get::<_, String>(12)?)?,
    })
}
