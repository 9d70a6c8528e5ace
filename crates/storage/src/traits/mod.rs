//! Storage port traits
//!
//! Async domain traits the service layer programs against. The SQLite
//! backend implements them by delegating its synchronous methods to the
//! blocking pool (see `sqlite_async`).

pub mod audit;
pub mod context;
pub mod session;

pub use audit::AuditStore;
pub use context::ContextStore;
pub use session::SessionStore;
