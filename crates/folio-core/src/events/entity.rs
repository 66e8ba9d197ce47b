//! Content-node change events.

use serde::{Deserialize, Serialize};

/// Events related to content node lifecycle.
///
/// The node kind travels as its lowercase wire name (`"shelf"`, `"book"`,
/// `"chapter"`, `"page"`) so this crate stays free of entity types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityEvent {
    /// A node was created.
    Created {
        /// The node id.
        node_id: i64,
        /// The node kind wire name.
        kind: String,
        /// The node name.
        name: String,
    },
    /// A node's identity or payload changed.
    Updated {
        /// The node id.
        node_id: i64,
        /// The node kind wire name.
        kind: String,
        /// The node name after the update.
        name: String,
    },
    /// A node was re-parented.
    Moved {
        /// The node id.
        node_id: i64,
        /// The node kind wire name.
        kind: String,
        /// The new parent book, if any.
        book_id: Option<i64>,
        /// The new parent chapter, if any.
        chapter_id: Option<i64>,
    },
    /// A node (and its structural subtree) was soft-deleted.
    SoftDeleted {
        /// The node id.
        node_id: i64,
        /// The node kind wire name.
        kind: String,
    },
    /// A soft-deleted node was restored.
    Restored {
        /// The node id.
        node_id: i64,
        /// The node kind wire name.
        kind: String,
    },
    /// A node was permanently removed.
    Purged {
        /// The node id.
        node_id: i64,
        /// The node kind wire name.
        kind: String,
    },
}
