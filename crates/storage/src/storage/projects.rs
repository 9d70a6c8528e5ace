use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row, params};
use ucl_core::{ProjectContext, Tier};

use super::{Storage, get_conn, log_row_error, parse_json, parse_ts, to_json};
use crate::error::StorageError;
use crate::events::{ChangeEvent, ChangeKind};

const SELECT_COLUMNS: &str = "id, name, description, repository_url, technologies, team_members, \
                              documentation_urls, global_context_id, platform_contexts, \
                              last_updated, version, created_at";

impl Storage {
    /// Create a project context. The project id becomes the stable
    /// external identifier every other record references.
    ///
    /// # Errors
    /// `Conflict` when the project name is already taken.
    pub(crate) fn create_project(&self, project: &ProjectContext) -> Result<ProjectContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO project_contexts
               (id, name, description, repository_url, technologies, team_members,
                documentation_urls, global_context_id, platform_contexts,
                last_updated, version, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                project.id,
                project.name,
                project.description,
                project.repository_url,
                to_json(&project.technologies)?,
                to_json(&project.team_members)?,
                to_json(&project.documentation_urls)?,
                project.global_context_id,
                to_json(&project.platform_contexts)?,
                project.last_updated.to_rfc3339(),
                project.version,
                project.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| match StorageError::from(e) {
            StorageError::Conflict(_) => {
                StorageError::Conflict(format!("project name already exists: {}", project.name))
            },
            other => other,
        })?;
        self.emit(ChangeEvent::new(
            ChangeKind::Created,
            Tier::Project,
            &project.id,
            &project.id,
            project.version,
        ));
        Ok(project.clone())
    }

    /// Get a project by id.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_project(&self, id: &str) -> Result<Option<ProjectContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let result = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM project_contexts WHERE id = ?1"),
                params![id],
                row_to_project,
            )
            .optional()?;
        Ok(result)
    }

    /// All projects, most recently updated first.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn list_projects(&self) -> Result<Vec<ProjectContext>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM project_contexts ORDER BY last_updated DESC"
        ))?;
        let results = stmt.query_map([], row_to_project)?.filter_map(log_row_error).collect();
        Ok(results)
    }

    /// Optimistic update: succeeds only when the stored version equals
    /// `expected_version`; bumps version and stamps `last_updated`.
    ///
    /// # Errors
    /// `VersionConflict` when stale, `NotFound` when the row is gone.
    pub(crate) fn update_project(
        &self,
        project: &ProjectContext,
        expected_version: i64,
    ) -> Result<ProjectContext, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now();
        let affected = conn.execute(
            "UPDATE project_contexts
               SET name = ?1, description = ?2, repository_url = ?3, technologies = ?4,
                   team_members = ?5, documentation_urls = ?6, global_context_id = ?7,
                   platform_contexts = ?8, last_updated = ?9, version = ?10
               WHERE id = ?11 AND version = ?12",
            params![
                project.name,
                project.description,
                project.repository_url,
                to_json(&project.technologies)?,
                to_json(&project.team_members)?,
                to_json(&project.documentation_urls)?,
                project.global_context_id,
                to_json(&project.platform_contexts)?,
                now.to_rfc3339(),
                expected_version + 1,
                project.id,
                expected_version,
            ],
        )?;
        if affected == 0 {
            return Err(self.version_conflict_or_not_found(
                &conn,
                "project_contexts",
                "project",
                &project.id,
                expected_version,
            ));
        }
        let mut updated = project.clone();
        updated.version = expected_version + 1;
        updated.last_updated = now;
        self.emit(ChangeEvent::new(
            ChangeKind::Updated,
            Tier::Project,
            &updated.id,
            &updated.id,
            updated.version,
        ));
        Ok(updated)
    }

    /// Delete a project; the schema cascades to every owned record.
    ///
    /// # Errors
    /// Returns error if the database delete fails.
    pub(crate) fn delete_project(&self, id: &str) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute("DELETE FROM project_contexts WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Distinguish a stale version from a missing row after a zero-row
    /// optimistic UPDATE.
    pub(crate) fn version_conflict_or_not_found(
        &self,
        conn: &rusqlite::Connection,
        table: &str,
        entity: &'static str,
        id: &str,
        expected: i64,
    ) -> StorageError {
        let actual: Result<Option<i64>, _> = conn
            .query_row(&format!("SELECT version FROM {table} WHERE id = ?1"), params![id], |row| {
                row.get(0)
            })
            .optional();
        match actual {
            Ok(Some(actual)) => {
                StorageError::VersionConflict { entity, id: id.to_owned(), expected, actual }
            },
            Ok(None) => StorageError::NotFound { entity, id: id.to_owned() },
            Err(e) => e.into(),
        }
    }
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<ProjectContext> {
    Ok(ProjectContext {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        repository_url: row.get(3)?,
        technologies: parse_json(&row.get::<_, String>(4)?)?,
        team_members: parse_json(&row.get::<_, String>(5)?)?,
        documentation_urls: parse_json(&row.get::<_, String>(6)?)?,
        global_context_id: row.get(7)?,
        platform_contexts: parse_json(&row.get::<_, String>(8)?)?,
        last_updated: parse_ts(&row.get::<_, String>(9)?)?,
        version: row.get(10)?,
        created_at: parse_ts(&row.get::<_, String>(11)?)?,
    })
}
