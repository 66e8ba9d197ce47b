//! In-memory node arena for batch resolution.
//!
//! Nodes are stored by composite reference with parent pointers as plain
//! ids. All walks are iterative, so resolution cost stays flat no matter
//! how a batch of nodes is shaped.

use std::collections::HashMap;

use folio_entity::node::{ContentNode, NodeRef};

/// Upper bound on ancestor-chain walks. The structural tree is at most
/// book -> chapter -> page deep; anything longer means corrupt parent
/// pointers and the walk stops rather than spinning.
const MAX_CHAIN: usize = 8;

/// Id-keyed storage for a working set of identity rows.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: HashMap<NodeRef, ContentNode>,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from a set of identity rows.
    pub fn from_nodes(nodes: impl IntoIterator<Item = ContentNode>) -> Self {
        let mut arena = Self::new();
        for node in nodes {
            arena.insert(node);
        }
        arena
    }

    /// Insert a node, replacing any previous row with the same reference.
    pub fn insert(&mut self, node: ContentNode) {
        self.nodes.insert(node.node_ref(), node);
    }

    /// Look up a node by reference.
    pub fn get(&self, node: NodeRef) -> Option<&ContentNode> {
        self.nodes.get(&node)
    }

    /// Check whether a node is loaded.
    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of loaded nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The ancestor chain for a node, nearest first, starting with the
    /// node itself. Parents missing from the arena end the walk.
    pub fn chain_of(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut chain = Vec::with_capacity(3);
        let mut current = Some(node);
        while let Some(node_ref) = current {
            if chain.len() >= MAX_CHAIN || chain.contains(&node_ref) {
                break;
            }
            chain.push(node_ref);
            current = self.get(node_ref).and_then(|n| n.parent_ref());
        }
        chain
    }

    /// The structural parent references still missing from the arena for
    /// every loaded node. Callers use this to decide what to fetch
    /// before resolving a batch.
    pub fn missing_parents(&self) -> Vec<NodeRef> {
        let mut missing: Vec<NodeRef> = self
            .nodes
            .values()
            .filter_map(|n| n.parent_ref())
            .filter(|p| !self.contains(*p))
            .collect();
        missing.sort_by_key(|r| (r.kind as u8, r.id));
        missing.dedup();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_entity::node::NodeKind;

    fn node(id: i64, kind: NodeKind, book_id: Option<i64>, chapter_id: Option<i64>) -> ContentNode {
        ContentNode {
            id,
            kind,
            name: format!("node-{id}"),
            slug: format!("node-{id}"),
            book_id,
            chapter_id,
            priority: 0,
            created_by: None,
            updated_by: None,
            owned_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_chain_walks_to_root() {
        let arena = NodeArena::from_nodes([
            node(1, NodeKind::Book, None, None),
            node(2, NodeKind::Chapter, Some(1), None),
            node(3, NodeKind::Page, Some(1), Some(2)),
        ]);
        let chain = arena.chain_of(NodeRef::new(3, NodeKind::Page));
        assert_eq!(
            chain,
            vec![
                NodeRef::new(3, NodeKind::Page),
                NodeRef::new(2, NodeKind::Chapter),
                NodeRef::new(1, NodeKind::Book),
            ]
        );
    }

    #[test]
    fn test_chain_stops_at_missing_parent() {
        let arena = NodeArena::from_nodes([node(3, NodeKind::Page, Some(1), Some(2))]);
        let chain = arena.chain_of(NodeRef::new(3, NodeKind::Page));
        // Parent chapter not loaded: chain covers only the page itself.
        assert_eq!(chain, vec![NodeRef::new(3, NodeKind::Page)]);
    }

    #[test]
    fn test_missing_parents_deduplicated() {
        let arena = NodeArena::from_nodes([
            node(3, NodeKind::Page, Some(1), None),
            node(4, NodeKind::Page, Some(1), None),
        ]);
        assert_eq!(arena.missing_parents(), vec![NodeRef::new(1, NodeKind::Book)]);
    }
}
