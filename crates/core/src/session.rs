use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::JsonMap;

/// One bounded period during which an AI agent queries a project's context.
///
/// Audit record: counters and sets only grow, `accessed_global_context`
/// is sticky once true, and the record is never deleted by core logic.
/// Mutations go through the same versioned update path as contexts so
/// concurrent `record_query` calls never lose increments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSession {
    pub id: String,
    pub project_id: String,
    /// Free-form agent tag: "claude", "chatgpt", "copilot", …
    pub ai_type: String,
    pub ai_instance_id: Option<String>,
    pub platform_context_id: Option<String>,
    pub session_start: DateTime<Utc>,
    /// `None` while the session is active.
    pub session_end: Option<DateTime<Utc>>,
    pub domains_accessed: BTreeSet<String>,
    pub queries_count: u32,
    pub last_query: Option<String>,
    /// Fingerprint of the context snapshot the agent last saw.
    pub context_hash: Option<String>,
    pub accessed_global_context: bool,
    pub metadata: JsonMap,
    pub version: i64,
}

/// Session lifecycle state, derived from `session_end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl AiSession {
    /// New active session with counters zeroed.
    #[must_use]
    pub fn start(project_id: impl Into<String>, ai_type: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            ai_type: ai_type.into(),
            ai_instance_id: None,
            platform_context_id: None,
            session_start: Utc::now(),
            session_end: None,
            domains_accessed: BTreeSet::new(),
            queries_count: 0,
            last_query: None,
            context_hash: None,
            accessed_global_context: false,
            metadata: JsonMap::new(),
            version: 1,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        if self.session_end.is_none() { SessionStatus::Active } else { SessionStatus::Ended }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session_end.is_none()
    }
}
