#![expect(clippy::unwrap_used, reason = "test code")]

use chrono::{Duration, Utc};

use super::{create_test_project, create_test_session, create_test_storage};

#[test]
fn create_and_get_session() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    let session = create_test_session(&project_id, "claude");

    storage.create_session(&session).unwrap();

    let retrieved = storage.get_session(&session.id).unwrap().unwrap();
    assert_eq!(retrieved.ai_type, "claude");
    assert!(retrieved.is_active());
    assert_eq!(retrieved.queries_count, 0);
    assert_eq!(retrieved.version, 1);
}

#[test]
fn versioned_session_update_detects_stale_writer() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    let mut session = create_test_session(&project_id, "claude");
    storage.create_session(&session).unwrap();

    session.queries_count = 1;
    let updated = storage.update_session(&session, 1).unwrap();
    assert_eq!(updated.version, 2);

    // A second caller still holding version 1 must not clobber the count.
    let err = storage.update_session(&session, 1).unwrap_err();
    assert!(err.is_version_conflict());
    assert_eq!(storage.get_session(&session.id).unwrap().unwrap().queries_count, 1);
}

#[test]
fn sessions_started_since_filters_by_window() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    let mut old = create_test_session(&project_id, "claude");
    old.session_start = Utc::now() - Duration::days(30);
    storage.create_session(&old).unwrap();

    let recent = create_test_session(&project_id, "chatgpt");
    storage.create_session(&recent).unwrap();

    let since = Utc::now() - Duration::days(7);
    let windowed = storage.sessions_started_since(&project_id, since).unwrap();
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].ai_type, "chatgpt");

    let all = storage.sessions_for_project(&project_id).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn close_stale_sessions_ends_only_old_active_ones() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    let mut stale = create_test_session(&project_id, "claude");
    stale.session_start = Utc::now() - Duration::hours(48);
    storage.create_session(&stale).unwrap();

    let fresh = create_test_session(&project_id, "claude");
    storage.create_session(&fresh).unwrap();

    let closed = storage.close_stale_sessions(24).unwrap();
    assert_eq!(closed, 1);

    assert!(!storage.get_session(&stale.id).unwrap().unwrap().is_active());
    assert!(storage.get_session(&fresh.id).unwrap().unwrap().is_active());
}

#[test]
fn delete_session_purges_row() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    let session = create_test_session(&project_id, "claude");
    storage.create_session(&session).unwrap();

    assert!(storage.delete_session(&session.id).unwrap());
    assert!(storage.get_session(&session.id).unwrap().is_none());
    assert!(!storage.delete_session(&session.id).unwrap());
}
