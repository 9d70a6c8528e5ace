use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object mapping used for all schemaless context fields.
pub type JsonMap = Map<String, Value>;

/// The four levels of the context hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Global,
    Platform,
    Domain,
    Project,
}

impl Tier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Platform => "platform",
            Self::Domain => "domain",
            Self::Project => "project",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project-wide knowledge shared by every platform and session.
///
/// Exactly one active `GlobalContext` exists per project. `version`
/// increases by 1 on every successful mutation and never decreases;
/// it is the only concurrency-control primitive for this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalContext {
    pub id: String,
    pub project_id: String,
    pub shared_knowledge: JsonMap,
    pub shared_conventions: JsonMap,
    pub shared_resources: Vec<Value>,
    pub common_patterns: BTreeSet<String>,
    pub cross_platform_insights: JsonMap,
    pub last_updated: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl GlobalContext {
    /// Fresh global context for a project, version 1.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            shared_knowledge: JsonMap::new(),
            shared_conventions: JsonMap::new(),
            shared_resources: Vec::new(),
            common_patterns: BTreeSet::new(),
            cross_platform_insights: JsonMap::new(),
            last_updated: now,
            version: 1,
            created_at: now,
        }
    }
}

/// Per-platform context (e.g. "frontend", "backend") under a project's
/// global context. `(project_id, platform_type)` is unique.
///
/// The link to the owning [`GlobalContext`] on this record is the
/// authoritative direction; the `platform_contexts` list on
/// [`ProjectContext`] is a derived cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformContext {
    pub id: String,
    pub project_id: String,
    pub global_context_id: Option<String>,
    pub platform_type: String,
    pub platform_specific_data: JsonMap,
    pub learned_preferences: JsonMap,
    /// Append-only: entries are never reordered or dropped through merge.
    pub interaction_history: Vec<Value>,
    pub custom_prompts: BTreeSet<String>,
    pub platform_conventions: JsonMap,
    pub performance_metrics: JsonMap,
    pub last_updated: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl PlatformContext {
    #[must_use]
    pub fn new(project_id: impl Into<String>, platform_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            global_context_id: None,
            platform_type: platform_type.into(),
            platform_specific_data: JsonMap::new(),
            learned_preferences: JsonMap::new(),
            interaction_history: Vec::new(),
            custom_prompts: BTreeSet::new(),
            platform_conventions: JsonMap::new(),
            performance_metrics: JsonMap::new(),
            last_updated: now,
            version: 1,
            created_at: now,
        }
    }
}

/// One structured API record inside a domain context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Context for a specific domain (frontend, backend, infrastructure, …)
/// within a project. `(project_id, domain_type)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainContext {
    pub id: String,
    pub project_id: String,
    pub domain_type: String,
    pub technologies: BTreeSet<String>,
    pub file_patterns: BTreeSet<String>,
    pub key_files: BTreeSet<String>,
    pub apis: Vec<ApiRecord>,
    pub dependencies: BTreeSet<String>,
    pub conventions: JsonMap,
    pub metadata: JsonMap,
    pub last_updated: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl DomainContext {
    #[must_use]
    pub fn new(project_id: impl Into<String>, domain_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            domain_type: domain_type.into(),
            technologies: BTreeSet::new(),
            file_patterns: BTreeSet::new(),
            key_files: BTreeSet::new(),
            apis: Vec::new(),
            dependencies: BTreeSet::new(),
            conventions: JsonMap::new(),
            metadata: JsonMap::new(),
            last_updated: now,
            version: 1,
            created_at: now,
        }
    }
}

/// Aggregate root: the project every other context record hangs off.
///
/// `id` is the stable external project identifier. `name` is required,
/// non-empty, and unique across projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub technologies: BTreeSet<String>,
    pub team_members: BTreeSet<String>,
    pub documentation_urls: BTreeSet<String>,
    pub global_context_id: Option<String>,
    /// Derived cache of platform context ids; refreshed on platform
    /// creation, never read as a source of truth.
    pub platform_contexts: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl ProjectContext {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            repository_url: None,
            technologies: BTreeSet::new(),
            team_members: BTreeSet::new(),
            documentation_urls: BTreeSet::new(),
            global_context_id: None,
            platform_contexts: Vec::new(),
            last_updated: now,
            version: 1,
            created_at: now,
        }
    }
}
