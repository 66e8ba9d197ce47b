//! Joint-permission rebuild configuration.

use serde::{Deserialize, Serialize};

/// Settings governing the joint-permission builder and rebuild worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildConfig {
    /// Number of nodes processed per chunk during a full rebuild.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
    /// Whether book-subtree rebuilds are offloaded to the async worker.
    #[serde(default)]
    pub async_book_rebuilds: bool,
    /// Worker poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum retry attempts for an outbox entry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            async_book_rebuilds: false,
            poll_interval_seconds: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_chunk_size() -> u32 {
    250
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_attempts() -> i32 {
    5
}
