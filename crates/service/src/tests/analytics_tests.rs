#![expect(clippy::unwrap_used, reason = "test code")]

use std::sync::Arc;

use super::{create_test_storage, seed_project};
use crate::{AnalyticsService, ContextService, QueryRequest, QueryService, SessionService};

#[tokio::test]
async fn zero_window_is_a_zeroed_snapshot_not_an_error() {
    let (storage, _temp_dir) = create_test_storage();
    let analytics = AnalyticsService::new(Arc::clone(&storage));
    let queries = QueryService::new(Arc::clone(&storage));
    let contexts = ContextService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;

    // Audit history exists, but none of it falls in a zero-length window.
    queries.query(&project_id, &QueryRequest::new("anything")).await.unwrap();

    let snapshot = analytics.aggregate(&project_id, 0).await.unwrap();
    assert!(snapshot.popular_queries.is_empty());
    assert_eq!(snapshot.total_recent_queries, 0);
    assert_eq!(snapshot.total_recent_sessions, 0);
    assert!(snapshot.sessions_by_ai_type.is_empty());
    assert!(snapshot.domains_touched.is_empty());
}

#[tokio::test]
async fn rejects_negative_window() {
    let (storage, _temp_dir) = create_test_storage();
    let analytics = AnalyticsService::new(Arc::clone(&storage));
    let contexts = ContextService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;

    let err = analytics.aggregate(&project_id, -1).await.unwrap_err();
    assert!(matches!(err, crate::ServiceError::Validation(_)));
}

#[tokio::test]
async fn aggregates_sessions_queries_and_domains() {
    let (storage, _temp_dir) = create_test_storage();
    let analytics = AnalyticsService::new(Arc::clone(&storage));
    let queries = QueryService::new(Arc::clone(&storage));
    let contexts = ContextService::new(Arc::clone(&storage));
    let sessions = SessionService::new(storage);
    let project_id = seed_project(&contexts, "p1").await;

    let claude_session = sessions
        .start_session(&project_id, "claude", None, None, ucl_core::JsonMap::new())
        .await
        .unwrap();
    let copilot_session = sessions
        .start_session(&project_id, "copilot", None, None, ucl_core::JsonMap::new())
        .await
        .unwrap();

    let request = QueryRequest {
        ai_session_id: Some(claude_session.id.clone()),
        domains_filter: ["frontend".to_owned()].into(),
        ..QueryRequest::new("auth flow")
    };
    queries.query(&project_id, &request).await.unwrap();
    queries.query(&project_id, &request).await.unwrap();

    sessions.end_session(&copilot_session.id).await.unwrap();

    let snapshot = analytics.aggregate(&project_id, 7).await.unwrap();
    assert_eq!(snapshot.popular_queries, vec![("auth flow".to_owned(), 2)]);
    assert_eq!(snapshot.total_recent_queries, 2);
    assert_eq!(snapshot.total_recent_sessions, 2);
    assert_eq!(snapshot.sessions_by_ai_type["claude"], 1);
    assert_eq!(snapshot.sessions_by_ai_type["copilot"], 1);
    assert_eq!(snapshot.active_sessions, 1);
    assert_eq!(snapshot.domains_touched, ["frontend".to_owned()].into());
    assert_eq!(snapshot.domains_touched_count, 1);
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let (storage, _temp_dir) = create_test_storage();
    let analytics = AnalyticsService::new(storage);

    let err = analytics.aggregate("ghost", 7).await.unwrap_err();
    assert!(err.is_not_found());
}
