//! Read-only analytics folds over the audit tables.
//!
//! Everything here is derived from `context_queries` and `ai_sessions`;
//! nothing is mutated, so an empty window is a zeroed snapshot, never an
//! error.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ucl_core::constants::POPULAR_QUERIES_LIMIT;
use ucl_storage::Storage;
use ucl_storage::traits::{AuditStore, ContextStore, SessionStore};

use crate::ServiceError;

/// Usage summary for one project over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub project_id: String,
    pub window_days: i64,
    /// Query texts by occurrence, count descending, ties lexicographic.
    pub popular_queries: Vec<(String, u64)>,
    pub total_recent_queries: u64,
    /// Session counts keyed by `ai_type`, windowed by session start.
    pub sessions_by_ai_type: BTreeMap<String, u64>,
    pub total_recent_sessions: u64,
    /// Currently active sessions, regardless of window.
    pub active_sessions: u64,
    /// Union of `domains_accessed` across windowed sessions.
    pub domains_touched: BTreeSet<String>,
    pub domains_touched_count: usize,
    pub generated_at: DateTime<Utc>,
}

pub struct AnalyticsService {
    storage: Arc<Storage>,
}

impl AnalyticsService {
    #[must_use]
    pub const fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Fold the last `window_days` days of audit records into a
    /// snapshot. `window_days = 0` means "now", so every windowed
    /// figure is zero.
    pub async fn aggregate(
        &self,
        project_id: &str,
        window_days: i64,
    ) -> Result<AnalyticsSnapshot, ServiceError> {
        if window_days < 0 {
            return Err(ServiceError::Validation("window_days must be >= 0".to_owned()));
        }
        self.storage
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))?;

        let since = Utc::now() - Duration::days(window_days);

        let popular_queries =
            self.storage.popular_queries(project_id, since, POPULAR_QUERIES_LIMIT).await?;
        let total_recent_queries = self.storage.count_queries_since(project_id, since).await?;

        let windowed = self.storage.sessions_started_since(project_id, since).await?;
        let mut sessions_by_ai_type: BTreeMap<String, u64> = BTreeMap::new();
        let mut domains_touched: BTreeSet<String> = BTreeSet::new();
        for session in &windowed {
            *sessions_by_ai_type.entry(session.ai_type.clone()).or_default() += 1;
            domains_touched.extend(session.domains_accessed.iter().cloned());
        }

        let active_sessions = self
            .storage
            .sessions_for_project(project_id)
            .await?
            .iter()
            .filter(|s| s.is_active())
            .count() as u64;

        Ok(AnalyticsSnapshot {
            project_id: project_id.to_owned(),
            window_days,
            popular_queries,
            total_recent_queries,
            total_recent_sessions: windowed.len() as u64,
            sessions_by_ai_type,
            active_sessions,
            domains_touched_count: domains_touched.len(),
            domains_touched,
            generated_at: Utc::now(),
        })
    }
}
