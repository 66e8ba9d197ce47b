//! Role default capability levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default capability of a role for a (kind, action) pair, applied when no
/// explicit rule exists anywhere on a node's ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "capability_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// No access.
    None,
    /// Access to owned nodes only.
    Own,
    /// Access to all nodes.
    All,
}

impl Capability {
    /// Resolved grant flags for this level: `(grant_all, grant_own)`.
    pub fn grants(&self) -> (bool, bool) {
        match self {
            Self::None => (false, false),
            Self::Own => (false, true),
            Self::All => (true, false),
        }
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Own => "own",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
