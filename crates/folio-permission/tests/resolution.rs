//! End-to-end resolution semantics over an in-memory tree.
//!
//! These tests drive the pure resolution core the builder feeds with
//! database state, materializing a full index for a small wiki and
//! checking the access answers a principal would get.

use std::collections::HashMap;

use chrono::Utc;
use folio_entity::node::{ContentNode, NodeKind, NodeRef};
use folio_entity::permission::{Action, Capability, JointPermission, PermissionRule};
use folio_entity::role::RoleCapabilities;
use folio_permission::hierarchy::NodeArena;
use folio_permission::joint::{RuleSet, resolve_node_rows};

const EDITOR: i64 = 7;
const ADMIN: i64 = 1;

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

/// A small wiki: book 1 holding chapter 2, page 3 (in the chapter, owned
/// by user 42) and page 4 (directly in the book, owned by user 42).
fn wiki() -> Vec<ContentNode> {
    vec![
        node(1, NodeKind::Book, None, None, None),
        node(2, NodeKind::Chapter, Some(1), None, None),
        node(3, NodeKind::Page, Some(1), Some(2), Some(42)),
        node(4, NodeKind::Page, Some(1), None, Some(42)),
    ]
}

/// Materialize the full index for every node, the way a full rebuild
/// does: resolve each node against the same arena, rules, and roles.
fn materialize(
    nodes: &[ContentNode],
    rules: &RuleSet,
    roles: &[RoleCapabilities],
) -> HashMap<(NodeRef, i64, Action), JointPermission> {
    let arena = NodeArena::from_nodes(nodes.iter().cloned());
    let mut index = HashMap::new();
    for n in nodes {
        for row in resolve_node_rows(n, &arena, rules, roles) {
            index.insert(
                (NodeRef::new(row.node_id, row.node_kind), row.role_id, row.action),
                row,
            );
        }
    }
    index
}

/// The applicator predicate over the materialized index: any row for one
/// of the principal's roles granting all-scope or owned own-scope access.
fn can(
    index: &HashMap<(NodeRef, i64, Action), JointPermission>,
    node: NodeRef,
    role_ids: &[i64],
    principal_id: i64,
    action: Action,
) -> bool {
    role_ids.iter().any(|role_id| {
        index
            .get(&(node, *role_id, action))
            .is_some_and(|row| row.permits(principal_id))
    })
}

fn editor_view(level: Capability) -> RoleCapabilities {
    RoleCapabilities::from_levels(EDITOR, [(NodeKind::Page, Action::View, level)])
}

#[test]
fn own_scoped_default_grants_only_the_owner() {
    // Role "editor" has view=own for pages; page 3 is owned by user 42.
    let roles = vec![editor_view(Capability::Own)];
    let index = materialize(&wiki(), &RuleSet::default(), &roles);

    let page = NodeRef::new(3, NodeKind::Page);
    assert!(can(&index, page, &[EDITOR], 42, Action::View));
    assert!(!can(&index, page, &[EDITOR], 7, Action::View));
}

#[test]
fn book_level_grant_cascades_to_chapter() {
    let roles = vec![RoleCapabilities::from_levels(EDITOR, [])];
    let rules = RuleSet::from_rules([rule(
        1,
        NodeKind::Book,
        Some(EDITOR),
        Action::View,
        true,
        false,
    )]);
    let index = materialize(&wiki(), &rules, &roles);

    let chapter = NodeRef::new(2, NodeKind::Chapter);
    assert!(can(&index, chapter, &[EDITOR], 99, Action::View));
}

#[test]
fn chapter_override_denies_descendants_but_not_siblings() {
    let roles = vec![RoleCapabilities::from_levels(EDITOR, [])];
    let rules = RuleSet::from_rules([
        rule(1, NodeKind::Book, Some(EDITOR), Action::View, true, false),
        rule(2, NodeKind::Chapter, Some(EDITOR), Action::View, false, false),
    ]);
    let index = materialize(&wiki(), &rules, &roles);

    // Page 3 sits under the overriding chapter: denied.
    assert!(!can(&index, NodeRef::new(3, NodeKind::Page), &[EDITOR], 42, Action::View));
    // Page 4 sits directly under the book: still allowed.
    assert!(can(&index, NodeRef::new(4, NodeKind::Page), &[EDITOR], 42, Action::View));
    // The book itself is untouched by the deeper override.
    assert!(can(&index, NodeRef::new(1, NodeKind::Book), &[EDITOR], 42, Action::View));
}

#[test]
fn moving_a_page_re_resolves_under_the_new_chain() {
    let roles = vec![RoleCapabilities::from_levels(EDITOR, [])];
    // Chapter 2 grants view; a second chapter 5 denies it.
    let mut nodes = wiki();
    nodes.push(node(5, NodeKind::Chapter, Some(1), None, None));
    let rules = RuleSet::from_rules([
        rule(2, NodeKind::Chapter, Some(EDITOR), Action::View, true, false),
        rule(5, NodeKind::Chapter, Some(EDITOR), Action::View, false, false),
    ]);

    let index = materialize(&nodes, &rules, &roles);
    let page = NodeRef::new(3, NodeKind::Page);
    assert!(can(&index, page, &[EDITOR], 42, Action::View));

    // Move page 3 from chapter 2 to chapter 5 and rebuild its rows.
    for n in &mut nodes {
        if n.id == 3 {
            n.chapter_id = Some(5);
        }
    }
    let index = materialize(&nodes, &rules, &roles);
    assert!(!can(&index, page, &[EDITOR], 42, Action::View));
}

#[test]
fn inheritance_is_monotonic_without_explicit_rules() {
    // With no explicit rules anywhere, every node resolves exactly to
    // its role defaults, so a child's grant equals its parent's for the
    // actions they share.
    let roles = vec![RoleCapabilities::from_levels(
        EDITOR,
        NodeKind::ALL
            .iter()
            .flat_map(|k| {
                k.applicable_actions()
                    .iter()
                    .map(|a| (*k, *a, Capability::All))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>(),
    )];
    let nodes = wiki();
    let index = materialize(&nodes, &RuleSet::default(), &roles);

    let arena = NodeArena::from_nodes(nodes.iter().cloned());
    for n in &nodes {
        let Some(parent_ref) = n.parent_ref() else {
            continue;
        };
        for action in n.kind.applicable_actions() {
            let parent_kind = arena.get(parent_ref).unwrap().kind;
            if !parent_kind.applicable_actions().contains(action) {
                continue;
            }
            let child = index.get(&(n.node_ref(), EDITOR, *action)).unwrap();
            let parent = index.get(&(parent_ref, EDITOR, *action)).unwrap();
            assert_eq!(child.grant_all, parent.grant_all);
            assert_eq!(child.grant_own, parent.grant_own);
        }
    }
}

#[test]
fn rebuilding_twice_yields_identical_rows() {
    let roles = vec![
        editor_view(Capability::Own),
        RoleCapabilities::from_levels(ADMIN, [(NodeKind::Page, Action::View, Capability::All)]),
    ];
    let rules = RuleSet::from_rules([rule(
        2,
        NodeKind::Chapter,
        None,
        Action::Update,
        false,
        true,
    )]);
    let nodes = wiki();

    let first = materialize(&nodes, &rules, &roles);
    let second = materialize(&nodes, &rules, &roles);
    assert_eq!(first, second);
}

#[test]
fn single_node_rebuild_matches_full_rebuild() {
    // Round trip: resolving one node in isolation (node rebuild) gives
    // the same rows the full materialization holds for it.
    let roles = vec![editor_view(Capability::Own)];
    let rules = RuleSet::from_rules([rule(
        1,
        NodeKind::Book,
        Some(EDITOR),
        Action::View,
        true,
        false,
    )]);
    let nodes = wiki();
    let full = materialize(&nodes, &rules, &roles);

    let arena = NodeArena::from_nodes(nodes.iter().cloned());
    for n in &nodes {
        for row in resolve_node_rows(n, &arena, &rules, &roles) {
            let key = (NodeRef::new(row.node_id, row.node_kind), row.role_id, row.action);
            assert_eq!(full.get(&key), Some(&row));
        }
    }
}

#[test]
fn principal_with_no_roles_is_denied_everywhere() {
    let roles = vec![editor_view(Capability::All)];
    let index = materialize(&wiki(), &RuleSet::default(), &roles);

    for n in wiki() {
        for action in n.kind.applicable_actions() {
            assert!(!can(&index, n.node_ref(), &[], 42, *action));
        }
    }
}

#[test]
fn missing_row_reads_as_denied() {
    // A role the builder never saw has no rows: the predicate fails
    // closed rather than erroring or falling back to live derivation.
    let roles = vec![editor_view(Capability::All)];
    let index = materialize(&wiki(), &RuleSet::default(), &roles);

    let unknown_role = 999;
    assert!(!can(
        &index,
        NodeRef::new(3, NodeKind::Page),
        &[unknown_role],
        42,
        Action::View
    ));
}
