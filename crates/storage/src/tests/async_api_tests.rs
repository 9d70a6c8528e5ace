//! The async port traits delegate the synchronous methods to the
//! blocking pool; exercised here through trait objects, the same way
//! the service layer reaches the store.

#![expect(clippy::unwrap_used, reason = "test code")]

use ucl_core::{ContextQuery, ProjectContext};

use super::{create_test_global, create_test_session, create_test_storage};
use crate::traits::{AuditStore, ContextStore, SessionStore};

#[tokio::test]
async fn context_surface_round_trips_through_the_trait() {
    let (storage, _temp_dir) = create_test_storage();
    let store: &dyn ContextStore = &storage;

    let project = store.create_project(&ProjectContext::new("p1")).await.unwrap();
    let fetched = store.get_project(&project.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "p1");

    let global = store.create_global_context(&create_test_global(&project.id)).await.unwrap();
    let updated = store.update_global_context(&global, global.version).await.unwrap();
    assert_eq!(updated.version, 2);

    let stats = store.get_stats().await.unwrap();
    assert_eq!(stats.project_count, 1);
    assert_eq!(stats.global_count, 1);
}

#[tokio::test]
async fn session_and_audit_surfaces_round_trip_through_the_traits() {
    let (storage, _temp_dir) = create_test_storage();
    let contexts: &dyn ContextStore = &storage;
    let sessions: &dyn SessionStore = &storage;
    let audit: &dyn AuditStore = &storage;

    let project = contexts.create_project(&ProjectContext::new("p1")).await.unwrap();
    let mut session = sessions.create_session(&create_test_session(&project.id, "claude")).await.unwrap();

    session.queries_count = 1;
    let updated = sessions.update_session(&session, session.version).await.unwrap();
    assert_eq!(updated.version, 2);

    let mut query = ContextQuery::new(&project.id, "how is auth done");
    query.ai_session_id = Some(session.id.clone());
    audit.save_query(&query).await.unwrap();

    let history = audit.query_history(&session.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query_text, "how is auth done");
}
