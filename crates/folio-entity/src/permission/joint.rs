//! Materialized joint permission rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::action::Action;
use crate::node::NodeKind;

/// One row of the materialized permission index, keyed by
/// `(node_id, node_kind, role_id, action)`.
///
/// Rows are fully derived by the builder and never hand-edited; the
/// owner id is denormalized at build time so ownership checks need no
/// join back to the identity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct JointPermission {
    /// The subject node id.
    pub node_id: i64,
    /// The subject node kind.
    pub node_kind: NodeKind,
    /// The role this row answers for.
    pub role_id: i64,
    /// The action this row answers for.
    pub action: Action,
    /// Access granted on the node regardless of ownership.
    pub grant_all: bool,
    /// Access granted only to the node's owner.
    pub grant_own: bool,
    /// The node's owner at build time.
    pub owned_by: Option<i64>,
}

impl JointPermission {
    /// Evaluate this row for a concrete principal id.
    pub fn permits(&self, principal_id: i64) -> bool {
        self.grant_all || (self.grant_own && self.owned_by == Some(principal_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(grant_all: bool, grant_own: bool, owned_by: Option<i64>) -> JointPermission {
        JointPermission {
            node_id: 1,
            node_kind: NodeKind::Page,
            role_id: 2,
            action: Action::View,
            grant_all,
            grant_own,
            owned_by,
        }
    }

    #[test]
    fn test_grant_all_ignores_owner() {
        assert!(row(true, false, None).permits(42));
    }

    #[test]
    fn test_grant_own_requires_matching_owner() {
        assert!(row(false, true, Some(42)).permits(42));
        assert!(!row(false, true, Some(42)).permits(7));
        assert!(!row(false, true, None).permits(42));
    }

    #[test]
    fn test_no_grants_denies() {
        assert!(!row(false, false, Some(42)).permits(42));
    }
}
