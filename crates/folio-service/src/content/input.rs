//! Flat node input and the per-kind field split.
//!
//! Callers pass one flat attribute bag for any kind; the static field
//! lists below decide which attributes land on the identity row and
//! which on the kind payload. Attributes outside the kind's list are
//! dropped (and logged), never written to the wrong table.

use serde::{Deserialize, Serialize};

use folio_entity::node::NodeKind;

/// Identity attributes accepted for every kind.
pub const IDENTITY_FIELDS: &[&str] = &["name", "book_id", "chapter_id", "priority"];

/// Payload attributes accepted for container kinds.
pub const CONTAINER_FIELDS: &[&str] = &[
    "description",
    "description_html",
    "default_template_id",
    "cover_image_id",
    "sort_rule_id",
];

/// Payload attributes accepted for pages.
pub const PAGE_FIELDS: &[&str] = &["draft", "template", "editor", "html", "markdown"];

/// A flat attribute bag for creating or updating any node kind.
///
/// Every field is optional; on update, unset fields leave the stored
/// value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeInput {
    /// Display name.
    pub name: Option<String>,
    /// Owning book (chapters and pages).
    pub book_id: Option<i64>,
    /// Owning chapter (chaptered pages).
    pub chapter_id: Option<i64>,
    /// Sibling ordering key.
    pub priority: Option<i32>,

    // -- Container fields --
    /// Plain-text description.
    pub description: Option<String>,
    /// HTML description (filtered before storage).
    pub description_html: Option<String>,
    /// Default template page reference; non-positive clears it.
    pub default_template_id: Option<i64>,
    /// Cover image reference; non-positive clears it.
    pub cover_image_id: Option<i64>,
    /// Sort rule reference; non-positive clears it.
    pub sort_rule_id: Option<i64>,

    // -- Page fields --
    /// Draft flag.
    pub draft: Option<bool>,
    /// Template flag.
    pub template: Option<bool>,
    /// Editor kind ("wysiwyg" or "markdown").
    pub editor: Option<String>,
    /// HTML content.
    pub html: Option<String>,
    /// Markdown source.
    pub markdown: Option<String>,
}

impl NodeInput {
    /// Names of set attributes that do not apply to the given kind.
    /// These are silently dropped by the store; the list exists so the
    /// drop can be logged.
    pub fn foreign_fields(&self, kind: NodeKind) -> Vec<&'static str> {
        let mut foreign = Vec::new();
        if kind.is_container() {
            if self.draft.is_some() {
                foreign.push("draft");
            }
            if self.template.is_some() {
                foreign.push("template");
            }
            if self.editor.is_some() {
                foreign.push("editor");
            }
            if self.html.is_some() {
                foreign.push("html");
            }
            if self.markdown.is_some() {
                foreign.push("markdown");
            }
        } else {
            if self.description.is_some() {
                foreign.push("description");
            }
            if self.description_html.is_some() {
                foreign.push("description_html");
            }
            if self.default_template_id.is_some() {
                foreign.push("default_template_id");
            }
            if self.cover_image_id.is_some() {
                foreign.push("cover_image_id");
            }
            if self.sort_rule_id.is_some() {
                foreign.push("sort_rule_id");
            }
        }
        // Structural parents only exist below book level.
        if matches!(kind, NodeKind::Shelf | NodeKind::Book) {
            if self.book_id.is_some() {
                foreign.push("book_id");
            }
            if self.chapter_id.is_some() {
                foreign.push("chapter_id");
            }
        }
        // Only pages can sit inside a chapter.
        if kind == NodeKind::Chapter && self.chapter_id.is_some() {
            foreign.push("chapter_id");
        }
        foreign
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_fields_foreign_on_containers() {
        let input = NodeInput {
            draft: Some(true),
            html: Some("<p>hi</p>".into()),
            description: Some("desc".into()),
            ..Default::default()
        };
        let foreign = input.foreign_fields(NodeKind::Book);
        assert!(foreign.contains(&"draft"));
        assert!(foreign.contains(&"html"));
        assert!(!foreign.contains(&"description"));
    }

    #[test]
    fn test_container_fields_foreign_on_pages() {
        let input = NodeInput {
            description: Some("desc".into()),
            default_template_id: Some(3),
            markdown: Some("# hi".into()),
            ..Default::default()
        };
        let foreign = input.foreign_fields(NodeKind::Page);
        assert!(foreign.contains(&"description"));
        assert!(foreign.contains(&"default_template_id"));
        assert!(!foreign.contains(&"markdown"));
    }

    #[test]
    fn test_parents_foreign_on_roots() {
        let input = NodeInput {
            book_id: Some(1),
            ..Default::default()
        };
        assert!(input.foreign_fields(NodeKind::Shelf).contains(&"book_id"));
        assert!(!input.foreign_fields(NodeKind::Chapter).contains(&"book_id"));
    }

    #[test]
    fn test_deserializes_from_flat_json_bag() {
        let input: NodeInput = serde_json::from_str(
            r#"{"name": "Guides", "description": "How-tos", "priority": 3}"#,
        )
        .unwrap();
        assert_eq!(input.name.as_deref(), Some("Guides"));
        assert_eq!(input.description.as_deref(), Some("How-tos"));
        assert_eq!(input.priority, Some(3));
        assert!(input.html.is_none());
    }
}
