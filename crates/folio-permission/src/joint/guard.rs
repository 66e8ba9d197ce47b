//! Lockout guard.
//!
//! A rule change or role deletion that would leave content unmanageable
//! is rejected before anything is written. The materialized index must
//! never contain a node that no role can administer.

use folio_core::error::AppError;
use folio_core::result::AppResult;
use folio_entity::node::ContentNode;
use folio_entity::permission::Action;
use folio_entity::role::RoleCapabilities;

use super::resolve::{RuleSet, resolve_grant};
use crate::hierarchy::NodeArena;

/// Verify that, under the given rule state, at least one role still
/// resolves to an all-scope `update` grant on the node. Callers pass a
/// rule set with the pending change already substituted in.
pub fn ensure_manageable(
    node: &ContentNode,
    arena: &NodeArena,
    rules: &RuleSet,
    roles: &[RoleCapabilities],
) -> AppResult<()> {
    let chain = arena.chain_of(node.node_ref());
    let manageable = roles
        .iter()
        .any(|role| resolve_grant(node, &chain, rules, role, Action::Update).0);

    if manageable {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Rule change would leave {} unmanageable: no role retains full update access",
            node.node_ref()
        )))
    }
}

/// Verify that a role can be deleted without removing the last role
/// holding all-scope update capability across every kind.
pub fn ensure_role_removable(roles: &[RoleCapabilities], role_id: i64) -> AppResult<()> {
    let target_is_manager = roles
        .iter()
        .any(|r| r.role_id == role_id && r.is_full_manager());
    if !target_is_manager {
        return Ok(());
    }

    let another_manager = roles
        .iter()
        .any(|r| r.role_id != role_id && r.is_full_manager());
    if another_manager {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Role {role_id} is the last role able to administer content and cannot be deleted"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_entity::node::{NodeKind, NodeRef};
    use folio_entity::permission::{Capability, PermissionRule};

    fn page(id: i64) -> ContentNode {
        ContentNode {
            id,
            kind: NodeKind::Page,
            name: format!("page-{id}"),
            slug: format!("page-{id}"),
            book_id: None,
            chapter_id: None,
            priority: 0,
            created_by: None,
            updated_by: None,
            owned_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn manager(role_id: i64) -> RoleCapabilities {
        RoleCapabilities::from_levels(
            role_id,
            NodeKind::ALL
                .iter()
                .map(|k| (*k, Action::Update, Capability::All))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_manageable_through_default_capability() {
        let node = page(1);
        let arena = NodeArena::from_nodes([node.clone()]);
        let roles = vec![manager(9)];
        assert!(ensure_manageable(&node, &arena, &RuleSet::default(), &roles).is_ok());
    }

    #[test]
    fn test_denying_rule_for_all_roles_is_blocked() {
        let node = page(1);
        let arena = NodeArena::from_nodes([node.clone()]);
        let roles = vec![manager(9)];
        // A pending everyone-sentinel rule revoking update for all roles.
        let rules = RuleSet::default().with_replaced(
            NodeRef::new(1, NodeKind::Page),
            vec![PermissionRule {
                id: 0,
                node_id: 1,
                node_kind: NodeKind::Page,
                role_id: None,
                action: Action::Update,
                grant_all: false,
                grant_own: false,
            }],
        );
        assert!(ensure_manageable(&node, &arena, &rules, &roles).is_err());
    }

    #[test]
    fn test_own_scope_update_does_not_count_as_manageable() {
        let node = page(1);
        let arena = NodeArena::from_nodes([node.clone()]);
        let roles = vec![RoleCapabilities::from_levels(
            9,
            [(NodeKind::Page, Action::Update, Capability::Own)],
        )];
        assert!(ensure_manageable(&node, &arena, &RuleSet::default(), &roles).is_err());
    }

    #[test]
    fn test_last_manager_role_cannot_be_deleted() {
        let roles = vec![manager(1), RoleCapabilities::from_levels(2, [])];
        assert!(ensure_role_removable(&roles, 1).is_err());
        assert!(ensure_role_removable(&roles, 2).is_ok());
    }

    #[test]
    fn test_manager_role_deletable_when_another_exists() {
        let roles = vec![manager(1), manager(2)];
        assert!(ensure_role_removable(&roles, 1).is_ok());
    }
}
