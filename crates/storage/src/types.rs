use serde::{Deserialize, Serialize};

/// Row counts across every table, for ops tooling and analytics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageStats {
    pub project_count: u64,
    pub global_count: u64,
    pub platform_count: u64,
    pub domain_count: u64,
    pub session_count: u64,
    pub query_count: u64,
    pub response_count: u64,
}
