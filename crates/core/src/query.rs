use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_MAX_RESULTS;
use crate::context::JsonMap;

/// Requested rendering of query results.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Structured,
    Markdown,
}

impl ResponseFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Markdown => "markdown",
        }
    }
}

impl std::str::FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structured" => Ok(Self::Structured),
            "markdown" => Ok(Self::Markdown),
            _ => Err(format!("invalid response format: {s}")),
        }
    }
}

/// Immutable audit record of one context query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextQuery {
    pub id: String,
    pub project_id: String,
    pub ai_session_id: Option<String>,
    pub query_text: String,
    pub domains_filter: BTreeSet<String>,
    pub response_format: ResponseFormat,
    pub include_history: bool,
    pub max_results: usize,
    pub timestamp: DateTime<Utc>,
}

impl ContextQuery {
    #[must_use]
    pub fn new(project_id: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            ai_session_id: None,
            query_text: query_text.into(),
            domains_filter: BTreeSet::new(),
            response_format: ResponseFormat::Structured,
            include_history: false,
            max_results: DEFAULT_MAX_RESULTS,
            timestamp: Utc::now(),
        }
    }
}

/// Where one result in a [`ContextResponse`] came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultSource {
    Global,
    Platform { platform_type: String },
    Domain { domain_type: String },
    /// A past query of the calling session, merged in by `include_history`.
    QueryHistory,
    /// A matching `interaction_history` entry from a platform context.
    Interaction { platform_type: String },
}

/// One ranked entry in a context query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResult {
    #[serde(flatten)]
    pub source: ResultSource,
    /// Count of distinct fields the query matched; 0 for history entries.
    pub score: u32,
    pub last_updated: DateTime<Utc>,
    /// Snapshot of the matched record.
    pub data: Value,
}

/// Immutable audit record answering one [`ContextQuery`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub id: String,
    pub query_id: String,
    pub project_id: String,
    pub results: Vec<ContextResult>,
    /// Domain types present in the truncated result set.
    pub domains_found: BTreeSet<String>,
    /// Candidate count before truncation to `max_results`.
    pub total_results: usize,
    pub processing_time_ms: f64,
    pub metadata: JsonMap,
    pub timestamp: DateTime<Utc>,
}

impl ContextResponse {
    #[must_use]
    pub fn new(query_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query_id: query_id.into(),
            project_id: project_id.into(),
            results: Vec::new(),
            domains_found: BTreeSet::new(),
            total_results: 0,
            processing_time_ms: 0.0,
            metadata: JsonMap::new(),
            timestamp: Utc::now(),
        }
    }
}
