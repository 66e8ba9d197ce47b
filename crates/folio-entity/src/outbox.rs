//! Rebuild outbox rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::node::NodeKind;

/// A queued subtree rebuild request.
///
/// Structural writes that cannot run their rebuild inline enqueue one of
/// these in the same unit of work; the rebuild worker drains pending rows
/// with bounded retries so permissions can never stay stale permanently.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RebuildJob {
    /// Row id.
    pub id: i64,
    /// Subtree root node id.
    pub node_id: i64,
    /// Subtree root node kind.
    pub node_kind: NodeKind,
    /// Number of execution attempts so far.
    pub attempts: i32,
    /// Maximum allowed attempts.
    pub max_attempts: i32,
    /// Error message from the last failed attempt.
    pub last_error: Option<String>,
    /// When the rebuild was requested.
    pub requested_at: DateTime<Utc>,
    /// When the rebuild completed (None = pending).
    pub processed_at: Option<DateTime<Utc>>,
}

impl RebuildJob {
    /// Check if the job can still be retried.
    pub fn can_retry(&self) -> bool {
        self.processed_at.is_none() && self.attempts < self.max_attempts
    }
}
