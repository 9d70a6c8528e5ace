use chrono::{Duration, Utc};
use rusqlite::{OptionalExtension as _, Row, params};
use ucl_core::AiSession;

use super::{Storage, get_conn, log_row_error, parse_json, parse_opt_ts, parse_ts, to_json};
use crate::error::StorageError;

const SELECT_COLUMNS: &str = "id, project_id, ai_type, ai_instance_id, platform_context_id, \
                              session_start, session_end, domains_accessed, queries_count, \
                              last_query, context_hash, accessed_global_context, metadata, version";

impl Storage {
    /// Persist a newly started session.
    ///
    /// # Errors
    /// Returns error if the database insert fails.
    pub(crate) fn create_session(&self, session: &AiSession) -> Result<AiSession, StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO ai_sessions
               (id, project_id, ai_type, ai_instance_id, platform_context_id, session_start,
                session_end, domains_accessed, queries_count, last_query, context_hash,
                accessed_global_context, metadata, version)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                session.id,
                session.project_id,
                session.ai_type,
                session.ai_instance_id,
                session.platform_context_id,
                session.session_start.to_rfc3339(),
                session.session_end.map(|d| d.to_rfc3339()),
                to_json(&session.domains_accessed)?,
                session.queries_count,
                session.last_query,
                session.context_hash,
                session.accessed_global_context,
                to_json(&session.metadata)?,
                session.version,
            ],
        )?;
        Ok(session.clone())
    }

    /// Get a session by id.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_session(&self, id: &str) -> Result<Option<AiSession>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let result = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM ai_sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )
            .optional()?;
        Ok(result)
    }

    /// Versioned session update. Sessions take the same optimistic path
    /// as contexts so concurrent `record_query` calls never lose
    /// increments.
    ///
    /// # Errors
    /// `VersionConflict` when stale, `NotFound` when the row is gone.
    pub(crate) fn update_session(
        &self,
        session: &AiSession,
        expected_version: i64,
    ) -> Result<AiSession, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute(
            "UPDATE ai_sessions
               SET session_end = ?1, domains_accessed = ?2, queries_count = ?3, last_query = ?4,
                   context_hash = ?5, accessed_global_context = ?6, metadata = ?7, version = ?8
               WHERE id = ?9 AND version = ?10",
            params![
                session.session_end.map(|d| d.to_rfc3339()),
                to_json(&session.domains_accessed)?,
                session.queries_count,
                session.last_query,
                session.context_hash,
                session.accessed_global_context,
                to_json(&session.metadata)?,
                expected_version + 1,
                session.id,
                expected_version,
            ],
        )?;
        if affected == 0 {
            return Err(self.version_conflict_or_not_found(
                &conn,
                "ai_sessions",
                "ai_session",
                &session.id,
                expected_version,
            ));
        }
        let mut updated = session.clone();
        updated.version = expected_version + 1;
        Ok(updated)
    }

    /// All sessions of a project, newest first.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn sessions_for_project(&self, project_id: &str) -> Result<Vec<AiSession>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM ai_sessions
               WHERE project_id = ?1 ORDER BY session_start DESC"
        ))?;
        let results =
            stmt.query_map(params![project_id], row_to_session)?.filter_map(log_row_error).collect();
        Ok(results)
    }

    /// Sessions of a project started at or after `since`, newest first.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn sessions_started_since(
        &self,
        project_id: &str,
        since: chrono::DateTime<Utc>,
    ) -> Result<Vec<AiSession>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM ai_sessions
               WHERE project_id = ?1 AND session_start >= ?2
               ORDER BY session_start DESC"
        ))?;
        let results = stmt
            .query_map(params![project_id, since.to_rfc3339()], row_to_session)?
            .filter_map(log_row_error)
            .collect();
        Ok(results)
    }

    /// End every active session idle longer than `max_age_hours`.
    /// Hook for an external idle-timeout sweeper; core never schedules it.
    ///
    /// # Errors
    /// Returns error if the database update fails.
    pub(crate) fn close_stale_sessions(&self, max_age_hours: i64) -> Result<usize, StorageError> {
        let conn = get_conn(&self.pool)?;
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let affected = conn.execute(
            "UPDATE ai_sessions
               SET session_end = ?1, version = version + 1
               WHERE session_end IS NULL AND session_start < ?2",
            params![Utc::now().to_rfc3339(), cutoff.to_rfc3339()],
        )?;
        if affected > 0 {
            tracing::info!(count = affected, "closed stale sessions");
        }
        Ok(affected)
    }

    /// Retention-purge hook: delete one session record.
    ///
    /// # Errors
    /// Returns error if the database delete fails.
    pub(crate) fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute("DELETE FROM ai_sessions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<AiSession> {
    Ok(AiSession {
        id: row.get(0)?,
        project_id: row.get(1)?,
        ai_type: row.get(2)?,
        ai_instance_id: row.get(3)?,
        platform_context_id: row.get(4)?,
        session_start: parse_ts(&row.get::<_, String>(5)?)?,
        session_end: parse_opt_ts(row.get(6)?)?,
        domains_accessed: parse_json(&row.get::<_, String>(7)?)?,
        queries_count: row.get(8)?,
        last_query: row.get(9)?,
        context_hash: row.get(10)?,
        accessed_global_context: row.get(11)?,
        metadata: parse_json(&row.get::<_, String>(12)?)?,
        version: row.get(13)?,
    })
}
