//! Append-only audit records: context queries and responses.
//!
//! Rows here are written once by the query engine and only read back by
//! `include_history` and the analytics fold. No update path exists.

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use ucl_core::{ContextQuery, ContextResponse, ResponseFormat};

use super::{Storage, get_conn, log_row_error, parse_json, parse_ts, to_json};
use crate::error::StorageError;
use crate::types::StorageStats;

impl Storage {
    /// Append a query audit record.
    ///
    /// # Errors
    /// Returns error if the database insert fails.
    pub(crate) fn save_query(&self, query: &ContextQuery) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO context_queries
               (id, project_id, ai_session_id, query_text, domains_filter, response_format,
                include_history, max_results, timestamp)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                query.id,
                query.project_id,
                query.ai_session_id,
                query.query_text,
                to_json(&query.domains_filter)?,
                query.response_format.as_str(),
                query.include_history,
                query.max_results as i64,
                query.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Append a response audit record.
    ///
    /// # Errors
    /// Returns error if the database insert fails.
    pub(crate) fn save_response(&self, response: &ContextResponse) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO context_responses
               (id, query_id, project_id, results, domains_found, total_results,
                processing_time_ms, metadata, timestamp)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                response.id,
                response.query_id,
                response.project_id,
                to_json(&response.results)?,
                to_json(&response.domains_found)?,
                response.total_results as i64,
                response.processing_time_ms,
                to_json(&response.metadata)?,
                response.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent logged queries of one session, newest first.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn query_history(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextQuery>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, ai_session_id, query_text, domains_filter, response_format,
                    include_history, max_results, timestamp
               FROM context_queries
               WHERE ai_session_id = ?1
               ORDER BY timestamp DESC
               LIMIT ?2",
        )?;
        let results = stmt
            .query_map(params![session_id, limit as i64], row_to_query)?
            .filter_map(log_row_error)
            .collect();
        Ok(results)
    }

    /// Top-N query texts by occurrence since `since`, count descending,
    /// ties broken lexicographically.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn popular_queries(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, u64)>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT query_text, COUNT(*) AS cnt
               FROM context_queries
               WHERE project_id = ?1 AND timestamp >= ?2
               GROUP BY query_text
               ORDER BY cnt DESC, query_text ASC
               LIMIT ?3",
        )?;
        let results = stmt
            .query_map(params![project_id, since.to_rfc3339(), limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .filter_map(log_row_error)
            .collect();
        Ok(results)
    }

    /// Number of queries logged for a project since `since`.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn count_queries_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM context_queries WHERE project_id = ?1 AND timestamp >= ?2",
            params![project_id, since.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Row counts across every table, for ops tooling.
    ///
    /// # Errors
    /// Returns error if the database query fails.
    pub(crate) fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let conn = get_conn(&self.pool)?;
        let count = |table: &str| -> Result<u64, StorageError> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as u64)
        };
        Ok(StorageStats {
            project_count: count("project_contexts")?,
            global_count: count("global_contexts")?,
            platform_count: count("platform_contexts")?,
            domain_count: count("domain_contexts")?,
            session_count: count("ai_sessions")?,
            query_count: count("context_queries")?,
            response_count: count("context_responses")?,
        })
    }
}

fn row_to_query(row: &Row<'_>) -> rusqlite::Result<ContextQuery> {
    let format: String = row.get(5)?;
    Ok(ContextQuery {
        id: row.get(0)?,
        project_id: row.get(1)?,
        ai_session_id: row.get(2)?,
        query_text: row.get(3)?,
        domains_filter: parse_json(&row.get::<_, String>(4)?)?,
        response_format: format
            .parse::<ResponseFormat>()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(e.into()))?,
        include_history: row.get(6)?,
        max_results: row.get::<_, i64>(7)? as usize,
        timestamp: parse_ts(&row.get::<_, String>(8)?)?,
    })
}
