//! Change event feed for context mutations.
//!
//! Every successful create/update on a context tier publishes a
//! [`ChangeEvent`]. Delivery is fire-and-forget: a send never blocks the
//! writing caller and a missing subscriber never fails the write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ucl_core::Tier;

/// What happened to a context record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
}

/// Notification of one successful context write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub tier: Tier,
    /// Id of the mutated record.
    pub key: String,
    pub project_id: String,
    /// Version after the write.
    pub version: i64,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub(crate) fn new(
        kind: ChangeKind,
        tier: Tier,
        key: impl Into<String>,
        project_id: impl Into<String>,
        version: i64,
    ) -> Self {
        Self { kind, tier, key: key.into(), project_id: project_id.into(), version, at: Utc::now() }
    }
}
