//! Shared constants for the Unified Context Layer.
//!
//! Centralizes policy numbers so the storage and service crates agree on
//! the same bounds.

/// Default `max_results` when a query does not specify one.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Hard ceiling on `max_results` for any context query (DoS protection).
/// Overridable via `UCL_MAX_RESULTS_CEILING`.
pub const MAX_RESULTS_CEILING: usize = 500;

/// Upper bound on re-read-and-retry attempts after a version conflict.
/// Applies to the session tracker's internal retry loop; callers mutating
/// contexts choose their own policy but should stay under a similar bound.
pub const MAX_VERSION_RETRIES: u32 = 5;

/// How many query-log entries `include_history` merges into a response.
pub const QUERY_HISTORY_LIMIT: usize = 10;

/// Top-N size for the popular-queries analytics fold.
pub const POPULAR_QUERIES_LIMIT: usize = 10;

/// Environment variable overriding [`MAX_RESULTS_CEILING`].
pub const ENV_MAX_RESULTS_CEILING: &str = "UCL_MAX_RESULTS_CEILING";
