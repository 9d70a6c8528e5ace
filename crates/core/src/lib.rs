//! Core types for the Unified Context Layer
//!
//! This crate contains the domain types shared across the storage and
//! service crates: the four context tiers, AI session records, the
//! query/response audit pair, and the pure merge computation applied
//! before every versioned write.

pub mod constants;
mod context;
mod env_config;
pub mod merge;
mod query;
mod session;

pub use context::*;
pub use env_config::env_parse_with_default;
pub use query::*;
pub use session::*;
