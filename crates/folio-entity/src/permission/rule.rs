//! Explicit per-node permission rules.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::action::Action;
use crate::node::NodeKind;

/// An explicit permission override attached directly to one node.
///
/// A node with zero rules inherits; a node with rules is authoritative
/// for itself and, unless overridden deeper, for its descendants.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionRule {
    /// Row id.
    pub id: i64,
    /// The node this rule is attached to.
    pub node_id: i64,
    /// The node's kind.
    pub node_kind: NodeKind,
    /// The role scoped by this rule; `None` is the sentinel meaning
    /// "every authenticated principal".
    pub role_id: Option<i64>,
    /// The action this rule governs.
    pub action: Action,
    /// Grant on all matching nodes.
    pub grant_all: bool,
    /// Grant only when the requesting principal owns the node.
    pub grant_own: bool,
}

impl PermissionRule {
    /// Check whether this rule applies when resolving for the given role.
    pub fn applies_to(&self, role_id: i64) -> bool {
        self.role_id.is_none() || self.role_id == Some(role_id)
    }
}

/// Input shape for replacing a node's rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// The role scoped by the rule (`None` = everyone sentinel).
    pub role_id: Option<i64>,
    /// The governed action.
    pub action: Action,
    /// Grant on all matching nodes.
    pub grant_all: bool,
    /// Grant only on owned nodes.
    pub grant_own: bool,
}
