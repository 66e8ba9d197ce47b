//! Node kind discriminator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::permission::Action;

/// The four content node kinds.
///
/// Shelves, books, and chapters are container kinds; pages hold leaf
/// content. A node's kind is immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "node_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A shelf grouping books (not a containment edge).
    Shelf,
    /// A book containing chapters and pages.
    Book,
    /// A chapter containing pages, itself inside a book.
    Chapter,
    /// A leaf page.
    Page,
}

impl NodeKind {
    /// All kinds, in identity-table order.
    pub const ALL: [NodeKind; 4] = [Self::Shelf, Self::Book, Self::Chapter, Self::Page];

    /// Check if this kind only aggregates children and metadata.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Shelf | Self::Book | Self::Chapter)
    }

    /// Actions materialized for this kind.
    ///
    /// `create` governs creating children, so leaf pages do not carry it.
    pub fn applicable_actions(&self) -> &'static [Action] {
        if self.is_container() {
            &[Action::View, Action::Create, Action::Update, Action::Delete]
        } else {
            &[Action::View, Action::Update, Action::Delete]
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shelf => "shelf",
            Self::Book => "book",
            Self::Chapter => "chapter",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = folio_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shelf" => Ok(Self::Shelf),
            "book" => Ok(Self::Book),
            "chapter" => Ok(Self::Chapter),
            "page" => Ok(Self::Page),
            _ => Err(folio_core::AppError::validation(format!(
                "Invalid node kind: '{s}'. Expected one of: shelf, book, chapter, page"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kinds() {
        assert!(NodeKind::Shelf.is_container());
        assert!(NodeKind::Book.is_container());
        assert!(NodeKind::Chapter.is_container());
        assert!(!NodeKind::Page.is_container());
    }

    #[test]
    fn test_pages_have_no_create_action() {
        assert!(!NodeKind::Page.applicable_actions().contains(&Action::Create));
        assert!(NodeKind::Book.applicable_actions().contains(&Action::Create));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("book".parse::<NodeKind>().unwrap(), NodeKind::Book);
        assert_eq!("PAGE".parse::<NodeKind>().unwrap(), NodeKind::Page);
        assert!("folder".parse::<NodeKind>().is_err());
    }
}
