#![expect(clippy::unwrap_used, reason = "test code")]

use chrono::{Duration, Utc};
use ucl_core::{ContextQuery, ContextResponse};

use super::{create_test_project, create_test_session, create_test_storage};
use crate::Storage;

fn log_query(storage: &Storage, project_id: &str, session_id: Option<&str>, text: &str) {
    let mut query = ContextQuery::new(project_id, text);
    query.ai_session_id = session_id.map(ToOwned::to_owned);
    storage.save_query(&query).unwrap();
    storage.save_response(&ContextResponse::new(&query.id, project_id)).unwrap();
}

#[test]
fn popular_queries_orders_by_count_then_text() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    log_query(&storage, &project_id, None, "bbb");
    log_query(&storage, &project_id, None, "bbb");
    log_query(&storage, &project_id, None, "aaa");
    log_query(&storage, &project_id, None, "ccc");

    let since = Utc::now() - Duration::days(7);
    let popular = storage.popular_queries(&project_id, since, 10).unwrap();
    assert_eq!(
        popular,
        vec![("bbb".to_owned(), 2), ("aaa".to_owned(), 1), ("ccc".to_owned(), 1)]
    );
}

#[test]
fn count_queries_respects_window() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");

    let mut old = ContextQuery::new(&project_id, "ancient");
    old.timestamp = Utc::now() - Duration::days(60);
    storage.save_query(&old).unwrap();
    log_query(&storage, &project_id, None, "recent");

    let since = Utc::now() - Duration::days(7);
    assert_eq!(storage.count_queries_since(&project_id, since).unwrap(), 1);
}

#[test]
fn empty_window_counts_zero_without_error() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    log_query(&storage, &project_id, None, "anything");

    // windowDays = 0: cutoff is now, nothing qualifies.
    let popular = storage.popular_queries(&project_id, Utc::now(), 10).unwrap();
    assert!(popular.is_empty());
    assert_eq!(storage.count_queries_since(&project_id, Utc::now()).unwrap(), 0);
}

#[test]
fn query_history_returns_newest_first_capped() {
    let (storage, _temp_dir) = create_test_storage();
    let project_id = create_test_project(&storage, "p1");
    let session = create_test_session(&project_id, "claude");
    storage.create_session(&session).unwrap();

    for i in 0..5 {
        let mut query = ContextQuery::new(&project_id, format!("query {i}"));
        query.ai_session_id = Some(session.id.clone());
        query.timestamp = Utc::now() - Duration::minutes(10 - i);
        storage.save_query(&query).unwrap();
    }

    let history = storage.query_history(&session.id, 3).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].query_text, "query 4");
    assert_eq!(history[2].query_text, "query 2");
}
