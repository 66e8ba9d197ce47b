//! Pure grant resolution.
//!
//! Given a working set of nodes, their explicit rules, and the role
//! capability tables, compute the joint permission rows for any node.
//! No I/O happens here; the builder loads state and feeds it in.

use std::collections::HashMap;

use folio_entity::node::{ContentNode, NodeRef};
use folio_entity::permission::{Action, JointPermission, PermissionRule};
use folio_entity::role::RoleCapabilities;

use crate::hierarchy::NodeArena;

/// Explicit rules grouped by owning node.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: HashMap<NodeRef, Vec<PermissionRule>>,
}

impl RuleSet {
    /// Group a flat rule list by owning node.
    pub fn from_rules(rules: impl IntoIterator<Item = PermissionRule>) -> Self {
        let mut grouped: HashMap<NodeRef, Vec<PermissionRule>> = HashMap::new();
        for rule in rules {
            grouped
                .entry(NodeRef::new(rule.node_id, rule.node_kind))
                .or_default()
                .push(rule);
        }
        Self { rules: grouped }
    }

    /// The rules attached to a node.
    pub fn for_node(&self, node: NodeRef) -> &[PermissionRule] {
        self.rules.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Swap in a replacement rule list for one node. Used by the lockout
    /// guard to evaluate a pending rule change before it is written.
    pub fn with_replaced(mut self, node: NodeRef, rules: Vec<PermissionRule>) -> Self {
        self.rules.insert(node, rules);
        self
    }
}

/// Resolve the full joint permission row set for one node: one row per
/// (role, applicable action).
pub fn resolve_node_rows(
    node: &ContentNode,
    arena: &NodeArena,
    rules: &RuleSet,
    roles: &[RoleCapabilities],
) -> Vec<JointPermission> {
    let chain = arena.chain_of(node.node_ref());
    let actions = node.kind.applicable_actions();
    let mut rows = Vec::with_capacity(roles.len() * actions.len());

    for role in roles {
        for action in actions {
            let (grant_all, grant_own) = resolve_grant(node, &chain, rules, role, *action);
            rows.push(JointPermission {
                node_id: node.id,
                node_kind: node.kind,
                role_id: role.role_id,
                action: *action,
                grant_all,
                grant_own,
                owned_by: node.owned_by,
            });
        }
    }
    rows
}

/// Resolve the grant flags for one (node, role, action) triple.
///
/// The nearest node on the chain (the node itself first, then each
/// ancestor outward) carrying an explicit rule for the role or the
/// everyone sentinel is authoritative. Multiple matching rules at that
/// node union most-permissively: resolution must never turn ambiguity
/// into a lockout. With no explicit rule anywhere on the chain, the
/// role's default capability for the node's kind decides.
pub fn resolve_grant(
    node: &ContentNode,
    chain: &[NodeRef],
    rules: &RuleSet,
    role: &RoleCapabilities,
    action: Action,
) -> (bool, bool) {
    for node_ref in chain {
        let matching: Vec<&PermissionRule> = rules
            .for_node(*node_ref)
            .iter()
            .filter(|r| r.action == action && r.applies_to(role.role_id))
            .collect();
        if !matching.is_empty() {
            let grant_all = matching.iter().any(|r| r.grant_all);
            let grant_own = matching.iter().any(|r| r.grant_own);
            return (grant_all, grant_own);
        }
    }
    role.level(node.kind, action).grants()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_entity::node::NodeKind;
    use folio_entity::permission::Capability;

    fn node(
        id: i64,
        kind: NodeKind,
        book_id: Option<i64>,
        chapter_id: Option<i64>,
        owned_by: Option<i64>,
    ) -> ContentNode {
        ContentNode {
            id,
            kind,
            name: format!("node-{id}"),
            slug: format!("node-{id}"),
            book_id,
            chapter_id,
            priority: 0,
            created_by: owned_by,
            updated_by: owned_by,
            owned_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn rule(
        node_id: i64,
        node_kind: NodeKind,
        role_id: Option<i64>,
        action: Action,
        grant_all: bool,
        grant_own: bool,
    ) -> PermissionRule {
        PermissionRule {
            id: 0,
            node_id,
            node_kind,
            role_id,
            action,
            grant_all,
            grant_own,
        }
    }

    /// Book 1 > chapter 2 > page 3, plus page 4 directly in the book.
    fn book_tree() -> NodeArena {
        NodeArena::from_nodes([
            node(1, NodeKind::Book, None, None, None),
            node(2, NodeKind::Chapter, Some(1), None, None),
            node(3, NodeKind::Page, Some(1), Some(2), Some(42)),
            node(4, NodeKind::Page, Some(1), None, Some(42)),
        ])
    }

    fn editor_with_view(level: Capability) -> RoleCapabilities {
        RoleCapabilities::from_levels(7, [(NodeKind::Page, Action::View, level)])
    }

    #[test]
    fn test_default_capability_applies_without_rules() {
        let arena = book_tree();
        let rules = RuleSet::default();
        let role = editor_with_view(Capability::Own);

        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(page.node_ref());
        assert_eq!(
            resolve_grant(page, &chain, &rules, &role, Action::View),
            (false, true)
        );
    }

    #[test]
    fn test_ancestor_rule_cascades_to_descendants() {
        let arena = book_tree();
        let rules = RuleSet::from_rules([rule(
            1,
            NodeKind::Book,
            Some(7),
            Action::View,
            true,
            false,
        )]);
        let role = editor_with_view(Capability::None);

        let chapter = arena.get(NodeRef::new(2, NodeKind::Chapter)).unwrap();
        let chain = arena.chain_of(chapter.node_ref());
        assert_eq!(
            resolve_grant(chapter, &chain, &rules, &role, Action::View),
            (true, false)
        );

        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(page.node_ref());
        assert_eq!(
            resolve_grant(page, &chain, &rules, &role, Action::View),
            (true, false)
        );
    }

    #[test]
    fn test_deeper_rule_overrides_ancestor_grant() {
        let arena = book_tree();
        // Book grants everything; the chapter slams the door.
        let rules = RuleSet::from_rules([
            rule(1, NodeKind::Book, Some(7), Action::View, true, false),
            rule(2, NodeKind::Chapter, Some(7), Action::View, false, false),
        ]);
        let role = editor_with_view(Capability::All);

        // Page under the chapter: denied through the chapter override.
        let chaptered = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(chaptered.node_ref());
        assert_eq!(
            resolve_grant(chaptered, &chain, &rules, &role, Action::View),
            (false, false)
        );

        // Sibling page directly under the book keeps the book grant.
        let direct = arena.get(NodeRef::new(4, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(direct.node_ref());
        assert_eq!(
            resolve_grant(direct, &chain, &rules, &role, Action::View),
            (true, false)
        );
    }

    #[test]
    fn test_everyone_sentinel_counts_as_explicit() {
        let arena = book_tree();
        let rules = RuleSet::from_rules([rule(
            2,
            NodeKind::Chapter,
            None,
            Action::View,
            false,
            true,
        )]);
        let role = editor_with_view(Capability::All);

        // The sentinel at the chapter beats the role default entirely.
        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(page.node_ref());
        assert_eq!(
            resolve_grant(page, &chain, &rules, &role, Action::View),
            (false, true)
        );
    }

    #[test]
    fn test_same_node_rules_union_most_permissive() {
        let arena = book_tree();
        // Direct rule denies, sentinel grants own: union is grant_own.
        let rules = RuleSet::from_rules([
            rule(3, NodeKind::Page, Some(7), Action::View, false, false),
            rule(3, NodeKind::Page, None, Action::View, false, true),
        ]);
        let role = editor_with_view(Capability::None);

        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(page.node_ref());
        assert_eq!(
            resolve_grant(page, &chain, &rules, &role, Action::View),
            (false, true)
        );
    }

    #[test]
    fn test_rule_for_other_action_is_ignored() {
        let arena = book_tree();
        let rules = RuleSet::from_rules([rule(
            3,
            NodeKind::Page,
            Some(7),
            Action::Update,
            true,
            false,
        )]);
        let role = editor_with_view(Capability::Own);

        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let chain = arena.chain_of(page.node_ref());
        // View falls through to the default despite the update rule.
        assert_eq!(
            resolve_grant(page, &chain, &rules, &role, Action::View),
            (false, true)
        );
    }

    #[test]
    fn test_resolved_rows_cover_applicable_actions() {
        let arena = book_tree();
        let rules = RuleSet::default();
        let roles = vec![editor_with_view(Capability::All)];

        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let rows = resolve_node_rows(page, &arena, &rules, &roles);
        // Pages carry view/update/delete, never create.
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.action != Action::Create));
        assert!(rows.iter().all(|r| r.owned_by == Some(42)));

        let book = arena.get(NodeRef::new(1, NodeKind::Book)).unwrap();
        let rows = resolve_node_rows(book, &arena, &rules, &roles);
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let arena = book_tree();
        let rules = RuleSet::from_rules([
            rule(1, NodeKind::Book, Some(7), Action::View, true, false),
            rule(2, NodeKind::Chapter, None, Action::Update, false, true),
        ]);
        let roles = vec![editor_with_view(Capability::Own)];

        let page = arena.get(NodeRef::new(3, NodeKind::Page)).unwrap();
        let first = resolve_node_rows(page, &arena, &rules, &roles);
        let second = resolve_node_rows(page, &arena, &rules, &roles);
        assert_eq!(first, second);
    }
}
