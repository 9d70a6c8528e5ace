//! Service layer for the unified context layer
//!
//! Centralizes business logic between driving adapters and storage.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::cognitive_complexity, reason = "Complex async flows are inherent")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod analytics_service;
mod context_service;
mod error;
mod query_service;
mod session_service;

pub use analytics_service::{AnalyticsService, AnalyticsSnapshot};
pub use context_service::ContextService;
pub use error::ServiceError;
pub use query_service::{QueryRequest, QueryService, RelevanceScorer, TokenMatchScorer};
pub use session_service::SessionService;

#[cfg(test)]
mod tests;
