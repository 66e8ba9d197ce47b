//! Database-backed hierarchy resolution.

use folio_core::result::AppResult;
use folio_database::repositories::node::NodeRepository;
use folio_entity::node::{ContentNode, NodeKind, NodeRef};

/// Resolves structural ancestors and descendants of content nodes.
///
/// The structural tree is book -> chapter -> page; shelves are roots with
/// no structural children. The shelf <-> book association is a loose
/// grouping resolved by a plain join elsewhere and is deliberately
/// excluded here — it carries no permission inheritance.
///
/// Walks include soft-deleted rows: restore and rebuild must see the
/// same tree the parent pointers describe, not just the live part.
#[derive(Debug, Clone)]
pub struct HierarchyResolver {
    nodes: NodeRepository,
}

impl HierarchyResolver {
    /// Create a new hierarchy resolver.
    pub fn new(nodes: NodeRepository) -> Self {
        Self { nodes }
    }

    /// The structural ancestors of a node, root first, excluding the
    /// node itself. At most two rows deep by construction; the walk is
    /// iterative and guards against corrupt parent pointers.
    pub async fn ancestors_of(&self, node: &ContentNode) -> AppResult<Vec<ContentNode>> {
        let mut ancestors: Vec<ContentNode> = Vec::with_capacity(2);
        let mut next = node.parent_ref();
        while let Some(parent_ref) = next {
            if ancestors.len() >= 4
                || ancestors.iter().any(|a| a.node_ref() == parent_ref)
                || parent_ref == node.node_ref()
            {
                break;
            }
            let Some(parent) = self.nodes.find_by_ref(parent_ref).await? else {
                break;
            };
            next = parent.parent_ref();
            ancestors.push(parent);
        }
        ancestors.reverse();
        Ok(ancestors)
    }

    /// The node plus its full structural subtree: a book yields its
    /// chapters and pages, a chapter its pages, a page or shelf itself.
    ///
    /// This is exactly the blast radius of a parent-pointer or explicit
    /// rule change on the node.
    pub async fn subtree_of(&self, node: &ContentNode) -> AppResult<Vec<ContentNode>> {
        let mut subtree = vec![node.clone()];
        match node.kind {
            NodeKind::Book => {
                subtree.extend(self.nodes.children_of_book(node.id).await?);
            }
            NodeKind::Chapter => {
                subtree.extend(self.nodes.pages_of_chapter(node.id).await?);
            }
            NodeKind::Shelf | NodeKind::Page => {}
        }
        Ok(subtree)
    }

    /// References for the node's subtree, for callers that only need the
    /// keys.
    pub async fn subtree_refs(&self, node: &ContentNode) -> AppResult<Vec<NodeRef>> {
        Ok(self
            .subtree_of(node)
            .await?
            .iter()
            .map(|n| n.node_ref())
            .collect())
    }

    /// The root-most node of the structural chain containing this node:
    /// the owning book for chapters and pages, the node itself for books
    /// and shelves. Used as the lock key so every rebuild touching the
    /// same book serializes on one advisory lock.
    pub async fn lock_root_of(&self, node: &ContentNode) -> AppResult<NodeRef> {
        match (node.kind, node.book_id) {
            (NodeKind::Chapter | NodeKind::Page, Some(book_id)) => {
                Ok(NodeRef::new(book_id, NodeKind::Book))
            }
            _ => Ok(node.node_ref()),
        }
    }
}
