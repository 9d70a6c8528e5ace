//! Context retrieval: token scoring, ranking, truncation, history merge,
//! and the audit trail every query leaves behind.
//!
//! This is a text/tag-filter ranking, not a similarity search. The
//! scoring function sits behind [`RelevanceScorer`] so a semantic scorer
//! can be injected without touching the query contract.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use ucl_core::constants::{
    DEFAULT_MAX_RESULTS, ENV_MAX_RESULTS_CEILING, MAX_RESULTS_CEILING, QUERY_HISTORY_LIMIT,
};
use ucl_core::env_parse_with_default;
use ucl_core::{ContextQuery, ContextResponse, ContextResult, ResponseFormat, ResultSource};
use ucl_storage::Storage;
use ucl_storage::traits::{AuditStore, ContextStore};

use crate::error::ServiceError;
use crate::session_service::SessionService;

/// One context query, service-boundary shape.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query_text: String,
    /// Empty set means "all domains plus global and platform tiers".
    pub domains_filter: BTreeSet<String>,
    pub ai_session_id: Option<String>,
    pub response_format: ResponseFormat,
    pub include_history: bool,
    pub max_results: usize,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            query_text: String::new(),
            domains_filter: BTreeSet::new(),
            ai_session_id: None,
            response_format: ResponseFormat::Structured,
            include_history: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl QueryRequest {
    #[must_use]
    pub fn new(query_text: impl Into<String>) -> Self {
        Self { query_text: query_text.into(), ..Self::default() }
    }
}

/// Pluggable relevance scoring.
///
/// `fields` holds one flattened text blob per scorable field of a
/// candidate record; the returned score is the count of fields the
/// query matched.
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, query_text: &str, fields: &[String]) -> u32;
}

/// Default scorer: case-insensitive token containment, one point per
/// distinct matching field.
pub struct TokenMatchScorer;

impl RelevanceScorer for TokenMatchScorer {
    fn score(&self, query_text: &str, fields: &[String]) -> u32 {
        let tokens = tokenize(query_text);
        if tokens.is_empty() {
            return 0;
        }
        let mut hits = 0;
        for field in fields {
            let haystack = field.to_lowercase();
            if tokens.iter().any(|t| haystack.contains(t.as_str())) {
                hits += 1;
            }
        }
        hits
    }
}

/// Lowercased alphanumeric tokens of a query string, deduplicated.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Scored candidate before truncation.
struct Candidate {
    source: ResultSource,
    score: u32,
    last_updated: DateTime<Utc>,
    data: Value,
    record_id: String,
    record_version: i64,
}

pub struct QueryService {
    storage: Arc<Storage>,
    sessions: SessionService,
    scorer: Arc<dyn RelevanceScorer>,
    max_results_ceiling: usize,
}

impl QueryService {
    #[must_use]
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            sessions: SessionService::new(Arc::clone(&storage)),
            storage,
            scorer: Arc::new(TokenMatchScorer),
            max_results_ceiling: env_parse_with_default(
                ENV_MAX_RESULTS_CEILING,
                MAX_RESULTS_CEILING,
            ),
        }
    }

    /// Swap the scoring function, keeping the rest of the pipeline.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Run one context query end to end: validate, resolve candidates,
    /// score, rank, truncate, optionally merge history, persist the
    /// query/response audit pair, and record session activity.
    pub async fn query(
        &self,
        project_id: &str,
        request: &QueryRequest,
    ) -> Result<ContextResponse, ServiceError> {
        if request.max_results == 0 {
            return Err(ServiceError::Validation("max_results must be positive".to_owned()));
        }
        let max_results = request.max_results.min(self.max_results_ceiling);
        self.storage
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("project {project_id}")))?;

        let started = Instant::now();

        // The query is logged before searching, so the audit trail keeps
        // queries whose search later fails.
        let mut query = ContextQuery::new(project_id, request.query_text.clone());
        query.ai_session_id = request.ai_session_id.clone();
        query.domains_filter = request.domains_filter.clone();
        query.response_format = request.response_format;
        query.include_history = request.include_history;
        query.max_results = max_results;
        self.storage.save_query(&query).await?;

        let mut candidates = self.resolve_candidates(project_id, &request.domains_filter).await?;
        self.score_candidates(&request.query_text, &mut candidates);

        let has_tokens = !tokenize(&request.query_text).is_empty();
        if has_tokens {
            candidates.retain(|c| c.score > 0);
        }
        candidates.sort_by(|a, b| {
            b.score.cmp(&a.score).then_with(|| b.last_updated.cmp(&a.last_updated))
        });

        let total_results = candidates.len();
        candidates.truncate(max_results);

        let domains_found: BTreeSet<String> = candidates
            .iter()
            .filter_map(|c| match &c.source {
                ResultSource::Domain { domain_type } => Some(domain_type.clone()),
                _ => None,
            })
            .collect();
        let touched_global =
            candidates.iter().any(|c| matches!(c.source, ResultSource::Global));
        let context_hash = fingerprint(&candidates);

        let mut results: Vec<ContextResult> = candidates
            .into_iter()
            .map(|c| ContextResult {
                source: c.source,
                score: c.score,
                last_updated: c.last_updated,
                data: c.data,
            })
            .collect();

        if request.include_history {
            let history = self
                .history_results(project_id, request.ai_session_id.as_deref(), &request.query_text)
                .await?;
            results.extend(history);
        }

        let mut response = ContextResponse::new(&query.id, project_id);
        response.results = results;
        response.domains_found = domains_found;
        response.total_results = total_results;
        response.processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        if request.response_format == ResponseFormat::Markdown {
            response
                .metadata
                .insert("markdown".to_owned(), Value::String(render_markdown(&response)));
        }
        self.storage.save_response(&response).await?;

        if let Some(session_id) = &request.ai_session_id {
            self.sessions
                .record_query(
                    session_id,
                    &request.domains_filter,
                    &request.query_text,
                    touched_global,
                    Some(&context_hash),
                )
                .await?;
        }

        tracing::debug!(
            project_id,
            total = response.total_results,
            returned = response.results.len(),
            elapsed_ms = response.processing_time_ms,
            "context query served"
        );
        Ok(response)
    }

    /// Resolve and score the candidate set. An empty filter widens the
    /// search to the global context, every platform, and every domain;
    /// a non-empty filter restricts to the named domain types only.
    async fn resolve_candidates(
        &self,
        project_id: &str,
        domains_filter: &BTreeSet<String>,
    ) -> Result<Vec<Candidate>, ServiceError> {
        let domains: Vec<ucl_core::DomainContext> = if domains_filter.is_empty() {
            self.storage.list_domain_contexts(project_id).await?
        } else {
            let mut named = Vec::new();
            for domain_type in domains_filter {
                if let Some(d) =
                    self.storage.get_domain_context(project_id, domain_type).await?
                {
                    named.push(d);
                }
            }
            named
        };

        let mut candidates = Vec::new();
        for domain in domains {
            candidates.push(Candidate {
                source: ResultSource::Domain { domain_type: domain.domain_type.clone() },
                score: 0,
                last_updated: domain.last_updated,
                record_id: domain.id.clone(),
                record_version: domain.version,
                data: serde_json::to_value(&domain)?,
            });
        }

        if domains_filter.is_empty() {
            if let Some(global) = self.storage.get_global_context(project_id).await? {
                candidates.push(Candidate {
                    source: ResultSource::Global,
                    score: 0,
                    last_updated: global.last_updated,
                    record_id: global.id.clone(),
                    record_version: global.version,
                    data: serde_json::to_value(&global)?,
                });
            }
            for platform in self.storage.list_platform_contexts(project_id).await? {
                candidates.push(Candidate {
                    source: ResultSource::Platform {
                        platform_type: platform.platform_type.clone(),
                    },
                    score: 0,
                    last_updated: platform.last_updated,
                    record_id: platform.id.clone(),
                    record_version: platform.version,
                    data: serde_json::to_value(&platform)?,
                });
            }
        }

        Ok(candidates)
    }

    /// Zero-score history entries appended after ranking: matching
    /// platform `interaction_history` items plus the calling session's
    /// recent query log, capped.
    async fn history_results(
        &self,
        project_id: &str,
        session_id: Option<&str>,
        query_text: &str,
    ) -> Result<Vec<ContextResult>, ServiceError> {
        let tokens = tokenize(query_text);
        let mut results = Vec::new();

        for platform in self.storage.list_platform_contexts(project_id).await? {
            for entry in &platform.interaction_history {
                let text = entry.to_string().to_lowercase();
                if tokens.is_empty() || tokens.iter().any(|t| text.contains(t.as_str())) {
                    results.push(ContextResult {
                        source: ResultSource::Interaction {
                            platform_type: platform.platform_type.clone(),
                        },
                        score: 0,
                        last_updated: platform.last_updated,
                        data: entry.clone(),
                    });
                }
            }
        }

        if let Some(session_id) = session_id {
            for past in self.storage.query_history(session_id, QUERY_HISTORY_LIMIT).await? {
                results.push(ContextResult {
                    source: ResultSource::QueryHistory,
                    score: 0,
                    last_updated: past.timestamp,
                    data: serde_json::to_value(&past)?,
                });
            }
        }

        Ok(results)
    }

    /// Apply the scorer over the scorable fields of every candidate.
    fn score_candidates(&self, query_text: &str, candidates: &mut [Candidate]) {
        for candidate in candidates {
            let fields = scorable_fields(&candidate.source, &candidate.data);
            candidate.score = self.scorer.score(query_text, &fields);
        }
    }
}

/// Flatten the per-tier scorable fields of a candidate into one text
/// blob per field.
fn scorable_fields(source: &ResultSource, data: &Value) -> Vec<String> {
    let field = |name: &str| data.get(name).map(value_text).unwrap_or_default();
    match source {
        ResultSource::Global => {
            vec![field("shared_knowledge"), field("common_patterns")]
        },
        ResultSource::Platform { .. } => vec![
            field("platform_specific_data"),
            field("learned_preferences"),
            field("platform_conventions"),
        ],
        ResultSource::Domain { .. } => {
            vec![field("technologies"), field("key_files"), field("conventions")]
        },
        ResultSource::QueryHistory | ResultSource::Interaction { .. } => Vec::new(),
    }
}

/// Recursive flatten of a JSON value into searchable text (object keys
/// included).
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => {
            items.iter().map(value_text).collect::<Vec<_>>().join(" ")
        },
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k} {}", value_text(v)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Deterministic fingerprint of the served context snapshot: uuid v5
/// over the sorted (record id, version) pairs.
fn fingerprint(candidates: &[Candidate]) -> String {
    let mut pairs: Vec<String> = candidates
        .iter()
        .map(|c| format!("{}:{}", c.record_id, c.record_version))
        .collect();
    pairs.sort_unstable();
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, pairs.join("\n").as_bytes()).to_string()
}

/// Pure formatting pass over structured results.
fn render_markdown(response: &ContextResponse) -> String {
    use std::fmt::Write as _;

    let mut out = String::from("# Context Results\n\n");
    let _ = writeln!(
        out,
        "{} of {} results, {:.1} ms\n",
        response.results.len(),
        response.total_results,
        response.processing_time_ms
    );
    for result in &response.results {
        let heading = match &result.source {
            ResultSource::Global => "Global context".to_owned(),
            ResultSource::Platform { platform_type } => format!("Platform: {platform_type}"),
            ResultSource::Domain { domain_type } => format!("Domain: {domain_type}"),
            ResultSource::QueryHistory => "Past query".to_owned(),
            ResultSource::Interaction { platform_type } => {
                format!("Interaction: {platform_type}")
            },
        };
        let _ = writeln!(out, "## {heading}");
        let _ = writeln!(out, "- score: {}", result.score);
        let _ = writeln!(out, "- last updated: {}", result.last_updated.to_rfc3339());
        let _ = writeln!(out, "```json\n{}\n```\n", result.data);
    }
    if !response.domains_found.is_empty() {
        let domains: Vec<&str> = response.domains_found.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Domains found: {}", domains.join(", "));
    }
    out
}
