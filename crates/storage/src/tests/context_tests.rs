#![expect(clippy::unwrap_used, reason = "test code")]

use super::{
    create_test_domain, create_test_global, create_test_platform, create_test_project,
    create_test_storage,
};
use crate::error::StorageError;
use ucl_core::ProjectContext;

#[test]
fn create_and_get_project() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "ucl-demo");

    let retrieved = storage.get_project(&project_id).unwrap().unwrap();
    assert_eq!(retrieved.name, "ucl-demo");
    assert_eq!(retrieved.version, 1);
}

#[test]
fn duplicate_project_name_is_conflict() {
    let (storage, _temp_dir) = create_test_storage();
    create_test_project(&storage, "same-name");

    let err = storage.create_project(&ProjectContext::new("same-name")).unwrap_err();
    assert!(err.is_conflict(), "expected Conflict, got {err:?}");
}

#[test]
fn second_global_context_for_project_is_conflict() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    storage.create_global_context(&create_test_global(&project_id)).unwrap();
    let err = storage.create_global_context(&create_test_global(&project_id)).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn global_create_backlinks_project() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    let global = storage.create_global_context(&create_test_global(&project_id)).unwrap();

    let project = storage.get_project(&project_id).unwrap().unwrap();
    assert_eq!(project.global_context_id.as_deref(), Some(global.id.as_str()));
}

#[test]
fn colliding_platform_type_is_conflict() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    storage.create_platform_context(&create_test_platform(&project_id, "frontend")).unwrap();
    let err = storage
        .create_platform_context(&create_test_platform(&project_id, "frontend"))
        .unwrap_err();
    assert!(err.is_conflict());

    // A different platform type under the same project is fine.
    storage.create_platform_context(&create_test_platform(&project_id, "backend")).unwrap();
}

#[test]
fn platform_create_refreshes_project_cache() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    let a = storage.create_platform_context(&create_test_platform(&project_id, "backend")).unwrap();
    let b =
        storage.create_platform_context(&create_test_platform(&project_id, "frontend")).unwrap();

    let project = storage.get_project(&project_id).unwrap().unwrap();
    assert_eq!(project.platform_contexts, vec![a.id, b.id]);
}

#[test]
fn colliding_domain_type_is_conflict() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    storage.create_domain_context(&create_test_domain(&project_id, "frontend")).unwrap();
    let err =
        storage.create_domain_context(&create_test_domain(&project_id, "frontend")).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn get_missing_returns_none_not_error() {
    let (storage, _temp_dir) = create_test_storage();
    assert!(storage.get_project("nope").unwrap().is_none());
    assert!(storage.get_global_context("nope").unwrap().is_none());
    assert!(storage.get_domain_context("nope", "frontend").unwrap().is_none());
}

#[test]
fn delete_project_cascades_to_owned_records() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    storage.create_global_context(&create_test_global(&project_id)).unwrap();
    storage.create_domain_context(&create_test_domain(&project_id, "frontend")).unwrap();

    assert!(storage.delete_project(&project_id).unwrap());

    assert!(storage.get_global_context(&project_id).unwrap().is_none());
    assert!(storage.list_domain_contexts(&project_id).unwrap().is_empty());
}

#[test]
fn update_missing_row_is_not_found() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    let ghost = create_test_domain(&project_id, "frontend");

    let err = storage.update_domain_context(&ghost, 1).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[test]
fn stats_counts_rows() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    storage.create_global_context(&create_test_global(&project_id)).unwrap();
    storage.create_domain_context(&create_test_domain(&project_id, "frontend")).unwrap();

    let stats = storage.get_stats().unwrap();
    assert_eq!(stats.project_count, 1);
    assert_eq!(stats.global_count, 1);
    assert_eq!(stats.domain_count, 1);
    assert_eq!(stats.session_count, 0);
}
