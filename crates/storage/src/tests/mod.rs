//! Test utilities and module declarations for storage tests.

use tempfile::TempDir;
use ucl_core::{AiSession, DomainContext, GlobalContext, PlatformContext, ProjectContext};

use crate::Storage;

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (storage, temp_dir)
}

/// Storage seeded with one project; returns the project id.
#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_project(storage: &Storage, name: &str) -> String {
    let project = ProjectContext::new(name);
    storage.create_project(&project).unwrap();
    project.id
}

pub fn create_test_global(project_id: &str) -> GlobalContext {
    let mut global = GlobalContext::new(project_id);
    global.shared_knowledge.insert("build_tool".to_owned(), serde_json::json!("cargo"));
    global.common_patterns.insert("hexagonal".to_owned());
    global
}

pub fn create_test_platform(project_id: &str, platform_type: &str) -> PlatformContext {
    let mut platform = PlatformContext::new(project_id, platform_type);
    platform.custom_prompts.insert("be terse".to_owned());
    platform
}

pub fn create_test_domain(project_id: &str, domain_type: &str) -> DomainContext {
    let mut domain = DomainContext::new(project_id, domain_type);
    domain.technologies.insert("React".to_owned());
    domain.key_files.insert("src/App.tsx".to_owned());
    domain
}

pub fn create_test_session(project_id: &str, ai_type: &str) -> AiSession {
    AiSession::start(project_id, ai_type)
}

mod async_api_tests;
mod audit_tests;
mod context_tests;
mod session_tests;
