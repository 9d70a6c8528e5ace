//! Migration v2: optimistic `version` columns on the remaining tables.
//!
//! v1 carried `version` only on global and platform contexts; projects,
//! domains, and sessions take the same optimistic update path, so they
//! need the column too.

use rusqlite::Connection;

use super::column_helpers::add_column_if_not_exists;

pub(super) fn apply(conn: &Connection) -> Result<(), rusqlite::Error> {
    add_column_if_not_exists(conn, "project_contexts", "version", "INTEGER NOT NULL DEFAULT 1")?;
    add_column_if_not_exists(conn, "domain_contexts", "version", "INTEGER NOT NULL DEFAULT 1")?;
    add_column_if_not_exists(conn, "ai_sessions", "version", "INTEGER NOT NULL DEFAULT 1")?;
    Ok(())
}
