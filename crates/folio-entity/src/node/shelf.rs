//! Shelf membership link rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A shelf <-> book association.
///
/// A loose many-to-many grouping, deliberately outside the containment
/// hierarchy: shelf membership carries no permission inheritance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShelfBook {
    /// The shelf node id.
    pub shelf_id: i64,
    /// The book node id.
    pub book_id: i64,
    /// Position of the book within the shelf.
    pub book_order: i32,
}
