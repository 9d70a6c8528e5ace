//! Storage layer for the Unified Context Layer
//!
//! SQLite-based storage for the four context tiers, AI sessions, and the
//! query/response audit log. There is no locking: writes are serialized
//! per record by an optimistic version check (`UPDATE … WHERE version =
//! expected`), and stale writers get `VersionConflict` to re-read and
//! retry. Reads never block writes.

mod error;
mod events;
mod migrations;
mod sqlite_async;
mod storage;
#[cfg(test)]
mod tests;
pub mod traits;
mod types;

pub use error::StorageError;
pub use events::{ChangeEvent, ChangeKind};
pub use storage::Storage;
pub use types::StorageStats;
