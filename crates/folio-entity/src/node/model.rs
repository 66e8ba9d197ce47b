//! Shared content node identity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::kind::NodeKind;

/// Composite identity of a content node.
///
/// Ids are allocated from one shared sequence but are only unique
/// together with the kind discriminator, so the pair travels everywhere
/// a node is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// The node id.
    pub id: i64,
    /// The node kind.
    pub kind: NodeKind,
}

impl NodeRef {
    /// Create a new node reference.
    pub fn new(id: i64, kind: NodeKind) -> Self {
        Self { id, kind }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// The shared identity row for all four node kinds.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentNode {
    /// Node id (unique per kind).
    pub id: i64,
    /// The kind discriminator. Immutable after creation.
    pub kind: NodeKind,
    /// Display name.
    pub name: String,
    /// URL slug, unique per kind among live nodes.
    pub slug: String,
    /// Owning book (set for chapters and pages).
    pub book_id: Option<i64>,
    /// Owning chapter (set only for pages inside a chapter).
    pub chapter_id: Option<i64>,
    /// Sibling ordering key.
    pub priority: i32,
    /// Principal that created the node (nullable after principal deletion).
    pub created_by: Option<i64>,
    /// Principal that last updated the node.
    pub updated_by: Option<i64>,
    /// Owning principal, denormalized into the joint index at build time.
    pub owned_by: Option<i64>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; hard removal only happens on purge.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ContentNode {
    /// The composite reference for this node.
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.id, self.kind)
    }

    /// The structural parent, if any.
    ///
    /// Pages resolve to their chapter when they have one, otherwise their
    /// book; chapters resolve to their book. Shelves and books are roots.
    /// Shelf membership is not a structural edge and never appears here.
    pub fn parent_ref(&self) -> Option<NodeRef> {
        match self.kind {
            NodeKind::Page => {
                if let Some(chapter_id) = self.chapter_id {
                    Some(NodeRef::new(chapter_id, NodeKind::Chapter))
                } else {
                    self.book_id.map(|id| NodeRef::new(id, NodeKind::Book))
                }
            }
            NodeKind::Chapter => self.book_id.map(|id| NodeRef::new(id, NodeKind::Book)),
            NodeKind::Shelf | NodeKind::Book => None,
        }
    }

    /// Check if this node only aggregates children and metadata.
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Check if this node is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Identity fields for a node about to be inserted.
///
/// The id and timestamps are assigned by the store; audit fields are
/// stamped from the acting principal by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNode {
    /// Display name.
    pub name: String,
    /// Pre-generated slug.
    pub slug: String,
    /// Owning book, for chapters and pages.
    pub book_id: Option<i64>,
    /// Owning chapter, for chaptered pages.
    pub chapter_id: Option<i64>,
    /// Sibling ordering key.
    pub priority: i32,
    /// The acting principal, stamped into created_by/updated_by/owned_by.
    pub actor_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(kind: NodeKind, book_id: Option<i64>, chapter_id: Option<i64>) -> ContentNode {
        ContentNode {
            id: 1,
            kind,
            name: "n".into(),
            slug: "n".into(),
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
    fn test_chaptered_page_parent_is_chapter() {
        let page = node(NodeKind::Page, Some(10), Some(20));
        assert_eq!(page.parent_ref(), Some(NodeRef::new(20, NodeKind::Chapter)));
    }

    #[test]
    fn test_direct_page_parent_is_book() {
        let page = node(NodeKind::Page, Some(10), None);
        assert_eq!(page.parent_ref(), Some(NodeRef::new(10, NodeKind::Book)));
    }

    #[test]
    fn test_books_and_shelves_are_roots() {
        assert_eq!(node(NodeKind::Book, None, None).parent_ref(), None);
        assert_eq!(node(NodeKind::Shelf, None, None).parent_ref(), None);
    }
}
