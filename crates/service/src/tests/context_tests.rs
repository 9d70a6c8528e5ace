#![expect(clippy::unwrap_used, reason = "test code")]

use std::sync::Arc;

use serde_json::json;
use ucl_core::merge::{DomainContextPatch, GlobalContextPatch, MutationKind};

use super::{create_test_storage, seed_project};
use crate::ContextService;

fn knowledge(pairs: &[(&str, &str)]) -> ucl_core::JsonMap {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), json!(v))).collect()
}

#[tokio::test]
async fn rejects_empty_project_name() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts = ContextService::new(storage);

    let err = contexts
        .create_project("  ", None, None, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, crate::ServiceError::Validation(_)));
}

#[tokio::test]
async fn rejects_invalid_file_pattern_glob() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts = ContextService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;

    let patch = DomainContextPatch {
        file_patterns: ["src/[".to_owned()].into(),
        ..Default::default()
    };
    let err = contexts
        .create_domain_context(&project_id, "frontend", &patch)
        .await
        .unwrap_err();
    assert!(matches!(err, crate::ServiceError::Validation(_)));
}

#[tokio::test]
async fn platform_create_links_existing_global() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts = ContextService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;

    let global = contexts
        .create_global_context(&project_id, &GlobalContextPatch::default())
        .await
        .unwrap();
    let platform = contexts
        .create_platform_context(&project_id, "frontend", &Default::default())
        .await
        .unwrap();

    assert_eq!(platform.global_context_id.as_deref(), Some(global.id.as_str()));
}

#[tokio::test]
async fn stale_update_aborts_before_merge() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts = ContextService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;
    contexts
        .create_global_context(&project_id, &GlobalContextPatch::default())
        .await
        .unwrap();

    let patch = GlobalContextPatch {
        shared_knowledge: knowledge(&[("k", "v")]),
        ..Default::default()
    };
    let err = contexts
        .update_global_context(&project_id, &patch, 99, MutationKind::Merge)
        .await
        .unwrap_err();
    assert!(err.is_version_conflict());

    // Nothing was merged or written.
    let current = contexts.get_global_context(&project_id).await.unwrap().unwrap();
    assert_eq!(current.version, 1);
    assert!(current.shared_knowledge.is_empty());
}

#[tokio::test]
async fn conflicting_writers_re_read_and_union() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts = ContextService::new(Arc::clone(&storage));
    let project_id = seed_project(&contexts, "p1").await;
    contexts
        .create_global_context(&project_id, &GlobalContextPatch::default())
        .await
        .unwrap();

    // Walk the record up to version 3.
    for key in ["warmup_a", "warmup_b"] {
        let version =
            contexts.get_global_context(&project_id).await.unwrap().unwrap().version;
        let patch = GlobalContextPatch {
            shared_knowledge: knowledge(&[(key, "x")]),
            ..Default::default()
        };
        contexts
            .update_global_context(&project_id, &patch, version, MutationKind::Merge)
            .await
            .unwrap();
    }

    // Both writers read version 3 and patch disjoint keys.
    let patch_a = GlobalContextPatch {
        shared_knowledge: knowledge(&[("deployment", "docker")]),
        ..Default::default()
    };
    let patch_b = GlobalContextPatch {
        shared_knowledge: knowledge(&[("testing", "pytest")]),
        ..Default::default()
    };

    let first = contexts
        .update_global_context(&project_id, &patch_a, 3, MutationKind::Merge)
        .await
        .unwrap();
    assert_eq!(first.version, 4);

    let err = contexts
        .update_global_context(&project_id, &patch_b, 3, MutationKind::Merge)
        .await
        .unwrap_err();
    assert!(err.is_version_conflict());

    let reread = contexts.get_global_context(&project_id).await.unwrap().unwrap();
    let second = contexts
        .update_global_context(&project_id, &patch_b, reread.version, MutationKind::Merge)
        .await
        .unwrap();

    assert_eq!(second.version, 5);
    assert_eq!(second.shared_knowledge["deployment"], json!("docker"));
    assert_eq!(second.shared_knowledge["testing"], json!("pytest"));
}

#[tokio::test]
async fn replace_is_the_removal_path() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts = ContextService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;
    contexts
        .create_global_context(
            &project_id,
            &GlobalContextPatch {
                common_patterns: ["old".to_owned()].into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let patch = GlobalContextPatch {
        common_patterns: ["new".to_owned()].into(),
        ..Default::default()
    };
    let replaced = contexts
        .update_global_context(&project_id, &patch, 1, MutationKind::Replace)
        .await
        .unwrap();

    assert!(!replaced.common_patterns.contains("old"));
    assert!(replaced.common_patterns.contains("new"));
    assert_eq!(replaced.version, 2);
}
