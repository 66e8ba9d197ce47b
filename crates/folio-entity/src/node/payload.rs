//! Kind-specific payload rows and the typed node boundary.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::kind::NodeKind;
use super::model::{ContentNode, NodeRef};

/// Extension row for the container kinds (shelf, book, chapter).
///
/// Keyed by `(node_id, kind)` — the kind is part of the key because the
/// numeric id space is shared across the single identity table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContainerData {
    /// The owning node id.
    pub node_id: i64,
    /// The owning node kind.
    pub kind: NodeKind,
    /// Plain-text description.
    pub description: String,
    /// Filtered HTML description.
    pub description_html: String,
    /// Default template page for new children, if set and still valid.
    pub default_template_id: Option<i64>,
    /// Cover image reference.
    pub cover_image_id: Option<i64>,
    /// Sort rule governing auto-sort of children.
    pub sort_rule_id: Option<i64>,
}

impl ContainerData {
    /// An empty payload for a freshly created container node.
    pub fn empty(node_id: i64, kind: NodeKind) -> Self {
        Self {
            node_id,
            kind,
            description: String::new(),
            description_html: String::new(),
            default_template_id: None,
            cover_image_id: None,
            sort_rule_id: None,
        }
    }
}

/// Extension row for pages. Keyed by page id alone — page ids are unique
/// across all kinds.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PageData {
    /// The owning page id.
    pub page_id: i64,
    /// Whether the page is an unpublished draft.
    pub draft: bool,
    /// Whether the page is flagged as a template.
    pub template: bool,
    /// Number of stored revisions.
    pub revision_count: i32,
    /// Editor used for the page ("wysiwyg" or "markdown").
    pub editor: String,
    /// Rendered HTML content.
    pub html: String,
    /// Plain-text content for search.
    pub text: String,
    /// Markdown source, when the markdown editor is in use.
    pub markdown: String,
}

impl PageData {
    /// An empty payload for a freshly created page.
    pub fn empty(page_id: i64) -> Self {
        Self {
            page_id,
            draft: false,
            template: false,
            revision_count: 0,
            editor: "wysiwyg".to_string(),
            html: String::new(),
            text: String::new(),
            markdown: String::new(),
        }
    }
}

/// A kind payload in write position: exactly one of the two extension
/// shapes, matched to the node's kind by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodePayload {
    /// Container payload (shelf, book, chapter).
    Container(ContainerData),
    /// Page payload.
    Page(PageData),
}

impl NodePayload {
    /// An empty payload matching the given node identity.
    pub fn empty(node_id: i64, kind: NodeKind) -> Self {
        if kind.is_container() {
            Self::Container(ContainerData::empty(node_id, kind))
        } else {
            Self::Page(PageData::empty(node_id))
        }
    }

    /// The container half, if this is a container payload.
    pub fn as_container(&self) -> Option<&ContainerData> {
        match self {
            Self::Container(data) => Some(data),
            Self::Page(_) => None,
        }
    }

    /// Mutable container half.
    pub fn as_container_mut(&mut self) -> Option<&mut ContainerData> {
        match self {
            Self::Container(data) => Some(data),
            Self::Page(_) => None,
        }
    }

    /// The page half, if this is a page payload.
    pub fn as_page(&self) -> Option<&PageData> {
        match self {
            Self::Page(data) => Some(data),
            Self::Container(_) => None,
        }
    }

    /// Mutable page half.
    pub fn as_page_mut(&mut self) -> Option<&mut PageData> {
        match self {
            Self::Page(data) => Some(data),
            Self::Container(_) => None,
        }
    }
}

/// A fully loaded node: shared identity plus its kind payload.
///
/// This is the only shape the store hands out, so callers never see an
/// identity row without its matching payload half.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// A shelf with container payload.
    Shelf {
        /// Identity fields.
        node: ContentNode,
        /// Container payload.
        data: ContainerData,
    },
    /// A book with container payload.
    Book {
        /// Identity fields.
        node: ContentNode,
        /// Container payload.
        data: ContainerData,
    },
    /// A chapter with container payload.
    Chapter {
        /// Identity fields.
        node: ContentNode,
        /// Container payload.
        data: ContainerData,
    },
    /// A page with page payload.
    Page {
        /// Identity fields.
        node: ContentNode,
        /// Page payload.
        data: PageData,
    },
}

impl Node {
    /// Assemble a node from its identity row and container payload.
    /// Panics in debug builds if the kind does not match the payload shape.
    pub fn from_container(node: ContentNode, data: ContainerData) -> Self {
        debug_assert!(node.kind.is_container());
        match node.kind {
            NodeKind::Shelf => Self::Shelf { node, data },
            NodeKind::Book => Self::Book { node, data },
            NodeKind::Chapter => Self::Chapter { node, data },
            NodeKind::Page => unreachable!("page nodes carry PageData"),
        }
    }

    /// Assemble a page from its identity row and page payload.
    pub fn from_page(node: ContentNode, data: PageData) -> Self {
        debug_assert_eq!(node.kind, NodeKind::Page);
        Self::Page { node, data }
    }

    /// The shared identity fields.
    pub fn content(&self) -> &ContentNode {
        match self {
            Self::Shelf { node, .. }
            | Self::Book { node, .. }
            | Self::Chapter { node, .. }
            | Self::Page { node, .. } => node,
        }
    }

    /// The node kind.
    pub fn kind(&self) -> NodeKind {
        self.content().kind
    }

    /// The composite node reference.
    pub fn node_ref(&self) -> NodeRef {
        self.content().node_ref()
    }

    /// The container payload, for container kinds.
    pub fn container_data(&self) -> Option<&ContainerData> {
        match self {
            Self::Shelf { data, .. } | Self::Book { data, .. } | Self::Chapter { data, .. } => {
                Some(data)
            }
            Self::Page { .. } => None,
        }
    }

    /// The page payload, for pages.
    pub fn page_data(&self) -> Option<&PageData> {
        match self {
            Self::Page { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Split into identity and payload halves.
    pub fn into_parts(self) -> (ContentNode, NodePayload) {
        match self {
            Self::Shelf { node, data } | Self::Book { node, data } | Self::Chapter { node, data } => {
                (node, NodePayload::Container(data))
            }
            Self::Page { node, data } => (node, NodePayload::Page(data)),
        }
    }

    /// Assemble from identity and payload halves.
    pub fn from_parts(node: ContentNode, payload: NodePayload) -> Self {
        match payload {
            NodePayload::Container(data) => Self::from_container(node, data),
            NodePayload::Page(data) => Self::from_page(node, data),
        }
    }
}
