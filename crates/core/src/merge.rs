//! Pure merge computation for context mutations.
//!
//! Every versioned write combines the incoming patch with the currently
//! stored record before the single atomic update. The computation lives
//! here (SPOT) so the storage layer only handles the version-checked
//! UPDATE and the service layer only handles staleness detection.
//!
//! # Merge rules
//! - **Mappings**: shallow key-wise union; an incoming key overwrites the
//!   stored value, absent keys are preserved
//! - **Sets**: union (removal requires [`MutationKind::Replace`])
//! - **Append-only sequences** (`interaction_history`): incoming elements
//!   appended, existing elements never reordered or dropped
//! - **Other sequences** (`shared_resources`, `apis`): appended, exact
//!   duplicates skipped
//! - **Scalars**: last-writer-wins via `Option` in the patch

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{
    ApiRecord, DomainContext, GlobalContext, JsonMap, PlatformContext, ProjectContext,
};

/// How an incoming patch combines with the stored record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// Field-wise merge per the rules above.
    #[default]
    Merge,
    /// Replace collection fields wholesale; the only path that removes.
    Replace,
}

/// Incoming key-wise union: `incoming` keys overwrite, others survive.
pub fn merge_map(existing: &mut JsonMap, incoming: &JsonMap) {
    for (k, v) in incoming {
        existing.insert(k.clone(), v.clone());
    }
}

/// Set union in place.
pub fn union_set(existing: &mut BTreeSet<String>, incoming: &BTreeSet<String>) {
    existing.extend(incoming.iter().cloned());
}

/// Append incoming elements, skipping exact duplicates already present.
pub fn append_unique<T: PartialEq + Clone>(existing: &mut Vec<T>, incoming: &[T]) {
    for item in incoming {
        if !existing.contains(item) {
            existing.push(item.clone());
        }
    }
}

// ── Global ───────────────────────────────────────────────────────

/// Mutation payload for a [`GlobalContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalContextPatch {
    #[serde(default)]
    pub shared_knowledge: JsonMap,
    #[serde(default)]
    pub shared_conventions: JsonMap,
    #[serde(default)]
    pub shared_resources: Vec<Value>,
    #[serde(default)]
    pub common_patterns: BTreeSet<String>,
    #[serde(default)]
    pub cross_platform_insights: JsonMap,
}

/// Merged copy of `existing` with `patch` applied. Identity, version and
/// timestamps are untouched; the storage layer bumps them atomically.
#[must_use]
pub fn merge_global(existing: &GlobalContext, patch: &GlobalContextPatch) -> GlobalContext {
    let mut merged = existing.clone();
    merge_map(&mut merged.shared_knowledge, &patch.shared_knowledge);
    merge_map(&mut merged.shared_conventions, &patch.shared_conventions);
    append_unique(&mut merged.shared_resources, &patch.shared_resources);
    union_set(&mut merged.common_patterns, &patch.common_patterns);
    merge_map(&mut merged.cross_platform_insights, &patch.cross_platform_insights);
    merged
}

/// Replace collection fields wholesale (explicit-removal path).
#[must_use]
pub fn replace_global(existing: &GlobalContext, patch: &GlobalContextPatch) -> GlobalContext {
    let mut replaced = existing.clone();
    replaced.shared_knowledge = patch.shared_knowledge.clone();
    replaced.shared_conventions = patch.shared_conventions.clone();
    replaced.shared_resources = patch.shared_resources.clone();
    replaced.common_patterns = patch.common_patterns.clone();
    replaced.cross_platform_insights = patch.cross_platform_insights.clone();
    replaced
}

// ── Platform ─────────────────────────────────────────────────────

/// Mutation payload for a [`PlatformContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformContextPatch {
    #[serde(default)]
    pub platform_specific_data: JsonMap,
    #[serde(default)]
    pub learned_preferences: JsonMap,
    #[serde(default)]
    pub interaction_history: Vec<Value>,
    #[serde(default)]
    pub custom_prompts: BTreeSet<String>,
    #[serde(default)]
    pub platform_conventions: JsonMap,
    #[serde(default)]
    pub performance_metrics: JsonMap,
}

#[must_use]
pub fn merge_platform(existing: &PlatformContext, patch: &PlatformContextPatch) -> PlatformContext {
    let mut merged = existing.clone();
    merge_map(&mut merged.platform_specific_data, &patch.platform_specific_data);
    merge_map(&mut merged.learned_preferences, &patch.learned_preferences);
    // Append-only: history entries may legitimately repeat, no dedup.
    merged.interaction_history.extend(patch.interaction_history.iter().cloned());
    union_set(&mut merged.custom_prompts, &patch.custom_prompts);
    merge_map(&mut merged.platform_conventions, &patch.platform_conventions);
    merge_map(&mut merged.performance_metrics, &patch.performance_metrics);
    merged
}

#[must_use]
pub fn replace_platform(
    existing: &PlatformContext,
    patch: &PlatformContextPatch,
) -> PlatformContext {
    let mut replaced = existing.clone();
    replaced.platform_specific_data = patch.platform_specific_data.clone();
    replaced.learned_preferences = patch.learned_preferences.clone();
    replaced.interaction_history = patch.interaction_history.clone();
    replaced.custom_prompts = patch.custom_prompts.clone();
    replaced.platform_conventions = patch.platform_conventions.clone();
    replaced.performance_metrics = patch.performance_metrics.clone();
    replaced
}

// ── Domain ───────────────────────────────────────────────────────

/// Mutation payload for a [`DomainContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainContextPatch {
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default)]
    pub file_patterns: BTreeSet<String>,
    #[serde(default)]
    pub key_files: BTreeSet<String>,
    #[serde(default)]
    pub apis: Vec<ApiRecord>,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default)]
    pub conventions: JsonMap,
    #[serde(default)]
    pub metadata: JsonMap,
}

#[must_use]
pub fn merge_domain(existing: &DomainContext, patch: &DomainContextPatch) -> DomainContext {
    let mut merged = existing.clone();
    union_set(&mut merged.technologies, &patch.technologies);
    union_set(&mut merged.file_patterns, &patch.file_patterns);
    union_set(&mut merged.key_files, &patch.key_files);
    append_unique(&mut merged.apis, &patch.apis);
    union_set(&mut merged.dependencies, &patch.dependencies);
    merge_map(&mut merged.conventions, &patch.conventions);
    merge_map(&mut merged.metadata, &patch.metadata);
    merged
}

#[must_use]
pub fn replace_domain(existing: &DomainContext, patch: &DomainContextPatch) -> DomainContext {
    let mut replaced = existing.clone();
    replaced.technologies = patch.technologies.clone();
    replaced.file_patterns = patch.file_patterns.clone();
    replaced.key_files = patch.key_files.clone();
    replaced.apis = patch.apis.clone();
    replaced.dependencies = patch.dependencies.clone();
    replaced.conventions = patch.conventions.clone();
    replaced.metadata = patch.metadata.clone();
    replaced
}

// ── Project ──────────────────────────────────────────────────────

/// Mutation payload for a [`ProjectContext`]. Scalars are
/// last-writer-wins: `Some` overwrites, `None` leaves untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContextPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default)]
    pub team_members: BTreeSet<String>,
    #[serde(default)]
    pub documentation_urls: BTreeSet<String>,
}

#[must_use]
pub fn merge_project(existing: &ProjectContext, patch: &ProjectContextPatch) -> ProjectContext {
    let mut merged = existing.clone();
    if let Some(name) = &patch.name {
        merged.name = name.clone();
    }
    if patch.description.is_some() {
        merged.description = patch.description.clone();
    }
    if patch.repository_url.is_some() {
        merged.repository_url = patch.repository_url.clone();
    }
    union_set(&mut merged.technologies, &patch.technologies);
    union_set(&mut merged.team_members, &patch.team_members);
    union_set(&mut merged.documentation_urls, &patch.documentation_urls);
    merged
}

#[must_use]
pub fn replace_project(existing: &ProjectContext, patch: &ProjectContextPatch) -> ProjectContext {
    let mut replaced = merge_project(existing, patch);
    replaced.technologies = patch.technologies.clone();
    replaced.team_members = patch.team_members.clone();
    replaced.documentation_urls = patch.documentation_urls.clone();
    replaced
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(pairs: &[(&str, Value)]) -> JsonMap {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    #[test]
    fn map_merge_incoming_key_overwrites() {
        let mut global = GlobalContext::new("p1");
        global.shared_knowledge = obj(&[("build", json!("make")), ("lang", json!("rust"))]);

        let patch = GlobalContextPatch {
            shared_knowledge: obj(&[("build", json!("cargo"))]),
            ..Default::default()
        };
        let merged = merge_global(&global, &patch);

        assert_eq!(merged.shared_knowledge["build"], json!("cargo"));
        assert_eq!(merged.shared_knowledge["lang"], json!("rust"));
    }

    #[test]
    fn disjoint_map_keys_union() {
        let mut global = GlobalContext::new("p1");
        global.shared_knowledge = obj(&[("a", json!(1))]);

        let patch = GlobalContextPatch {
            shared_knowledge: obj(&[("b", json!(2))]),
            ..Default::default()
        };
        let merged = merge_global(&global, &patch);

        assert_eq!(merged.shared_knowledge.len(), 2);
        assert_eq!(merged.shared_knowledge["a"], json!(1));
        assert_eq!(merged.shared_knowledge["b"], json!(2));
    }

    #[test]
    fn set_merge_never_removes() {
        let mut global = GlobalContext::new("p1");
        global.common_patterns = ["repository".to_owned(), "cqrs".to_owned()].into();

        let patch = GlobalContextPatch {
            common_patterns: ["hexagonal".to_owned()].into(),
            ..Default::default()
        };
        let merged = merge_global(&global, &patch);

        assert_eq!(merged.common_patterns.len(), 3);
        assert!(merged.common_patterns.contains("cqrs"));
    }

    #[test]
    fn replace_removes_absent_entries() {
        let mut global = GlobalContext::new("p1");
        global.common_patterns = ["old".to_owned()].into();

        let patch = GlobalContextPatch {
            common_patterns: ["new".to_owned()].into(),
            ..Default::default()
        };
        let replaced = replace_global(&global, &patch);

        assert!(!replaced.common_patterns.contains("old"));
        assert!(replaced.common_patterns.contains("new"));
    }

    #[test]
    fn interaction_history_appends_without_reorder() {
        let mut platform = PlatformContext::new("p1", "frontend");
        platform.interaction_history = vec![json!({"n": 1}), json!({"n": 2})];

        let patch = PlatformContextPatch {
            interaction_history: vec![json!({"n": 3}), json!({"n": 1})],
            ..Default::default()
        };
        let merged = merge_platform(&platform, &patch);

        // Existing prefix preserved; repeats are legal in history.
        assert_eq!(
            merged.interaction_history,
            vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3}), json!({"n": 1})]
        );
    }

    #[test]
    fn apis_append_skips_exact_duplicates() {
        let mut domain = DomainContext::new("p1", "backend");
        let api = ApiRecord {
            name: "list_users".to_owned(),
            method: Some("GET".to_owned()),
            path: Some("/users".to_owned()),
            description: None,
        };
        domain.apis = vec![api.clone()];

        let patch = DomainContextPatch { apis: vec![api], ..Default::default() };
        let merged = merge_domain(&domain, &patch);

        assert_eq!(merged.apis.len(), 1);
    }

    #[test]
    fn project_scalars_last_writer_wins() {
        let mut project = ProjectContext::new("ucl");
        project.description = Some("old".to_owned());

        let patch = ProjectContextPatch {
            description: Some("new".to_owned()),
            ..Default::default()
        };
        let merged = merge_project(&project, &patch);

        assert_eq!(merged.description.as_deref(), Some("new"));
        assert_eq!(merged.name, "ucl");
    }

    #[test]
    fn merge_preserves_identity_and_version() {
        let mut global = GlobalContext::new("p1");
        global.version = 7;

        let merged = merge_global(&global, &GlobalContextPatch::default());

        assert_eq!(merged.id, global.id);
        assert_eq!(merged.version, 7);
    }
}
