//! Role and default-capability models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::node::NodeKind;
use crate::permission::{Action, Capability};

/// A role assignable to principals.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role id.
    pub id: i64,
    /// Human-readable name.
    pub display_name: String,
    /// Stable machine name, unique.
    pub system_name: String,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One default-capability row: the level a role gets for a (kind, action)
/// pair when no explicit rule interrupts inheritance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleCapability {
    /// The role.
    pub role_id: i64,
    /// The node kind.
    pub kind: NodeKind,
    /// The action.
    pub action: Action,
    /// The granted level.
    pub level: Capability,
}

/// A role's capability table, loaded once per rebuild pass.
#[derive(Debug, Clone)]
pub struct RoleCapabilities {
    /// The role id.
    pub role_id: i64,
    levels: HashMap<(NodeKind, Action), Capability>,
}

impl RoleCapabilities {
    /// Build the lookup from capability rows. Rows for other roles are
    /// ignored so a shared result set can be partitioned by the caller.
    pub fn new(role_id: i64, rows: &[RoleCapability]) -> Self {
        let levels = rows
            .iter()
            .filter(|r| r.role_id == role_id)
            .map(|r| ((r.kind, r.action), r.level))
            .collect();
        Self { role_id, levels }
    }

    /// Construct from explicit (kind, action, level) triples.
    pub fn from_levels(
        role_id: i64,
        levels: impl IntoIterator<Item = (NodeKind, Action, Capability)>,
    ) -> Self {
        Self {
            role_id,
            levels: levels
                .into_iter()
                .map(|(kind, action, level)| ((kind, action), level))
                .collect(),
        }
    }

    /// The default level for a (kind, action) pair. A missing row is
    /// `Capability::None`.
    pub fn level(&self, kind: NodeKind, action: Action) -> Capability {
        self.levels
            .get(&(kind, action))
            .copied()
            .unwrap_or(Capability::None)
    }

    /// Check whether this role holds all-scope update capability for
    /// every kind (the system-administration shape the lockout guard
    /// protects).
    pub fn is_full_manager(&self) -> bool {
        NodeKind::ALL
            .iter()
            .all(|kind| self.level(*kind, Action::Update) == Capability::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_row_is_none() {
        let caps = RoleCapabilities::from_levels(1, []);
        assert_eq!(caps.level(NodeKind::Page, Action::View), Capability::None);
    }

    #[test]
    fn test_full_manager_requires_all_kinds() {
        let partial = RoleCapabilities::from_levels(
            1,
            [(NodeKind::Book, Action::Update, Capability::All)],
        );
        assert!(!partial.is_full_manager());

        let full = RoleCapabilities::from_levels(
            1,
            NodeKind::ALL
                .iter()
                .map(|k| (*k, Action::Update, Capability::All))
                .collect::<Vec<_>>(),
        );
        assert!(full.is_full_manager());
    }
}
