//! Test utilities and module declarations for service tests.

use std::sync::Arc;

use tempfile::TempDir;
use ucl_storage::Storage;

use crate::ContextService;

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (Arc<Storage>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (Arc::new(storage), temp_dir)
}

/// Project seeded through the service; returns its id.
#[expect(clippy::unwrap_used, reason = "test code")]
pub async fn seed_project(contexts: &ContextService, name: &str) -> String {
    contexts
        .create_project(name, None, None, std::collections::BTreeSet::new())
        .await
        .unwrap()
        .id
}

mod analytics_tests;
mod context_tests;
