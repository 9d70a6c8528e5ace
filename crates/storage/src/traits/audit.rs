use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ucl_core::{ContextQuery, ContextResponse};

use crate::error::StorageError;

/// Append-only query/response audit records and the read-side folds
/// analytics runs over them.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a query audit record.
    async fn save_query(&self, query: &ContextQuery) -> Result<(), StorageError>;

    /// Append a response audit record.
    async fn save_response(&self, response: &ContextResponse) -> Result<(), StorageError>;

    /// Most recent logged queries of one session, newest first.
    async fn query_history(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextQuery>, StorageError>;

    /// Top-N query texts by occurrence since `since`, count descending,
    /// ties lexicographic.
    async fn popular_queries(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, u64)>, StorageError>;

    /// Number of queries logged since `since`.
    async fn count_queries_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError>;
}
