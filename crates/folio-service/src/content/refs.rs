//! Optional reference validation.
//!
//! Template, cover image, and sort rule references degrade to `None`
//! when invalid instead of failing the whole write: a stale reference in
//! a form submission must never block an unrelated save.

use tracing::debug;

use folio_core::result::AppResult;
use folio_database::repositories::node::NodeRepository;
use folio_entity::node::NodeKind;

/// Validates optional references on container payloads.
#[derive(Debug, Clone)]
pub struct ReferenceValidator {
    nodes: NodeRepository,
}

impl ReferenceValidator {
    /// Create a new reference validator.
    pub fn new(nodes: NodeRepository) -> Self {
        Self { nodes }
    }

    /// Validate a default-template reference: the page must exist, be
    /// live, be flagged as a template, and not be a draft. Anything else
    /// resolves to `None`.
    pub async fn validated_template_id(&self, template_id: Option<i64>) -> AppResult<Option<i64>> {
        let Some(id) = template_id.filter(|id| *id > 0) else {
            return Ok(None);
        };
        let pages = self.nodes.scope(NodeKind::Page);
        if pages.is_live_template(id).await? {
            Ok(Some(id))
        } else {
            debug!(template_id = id, "Dropping invalid default template reference");
            Ok(None)
        }
    }

    /// Normalize an opaque external reference (cover image, sort rule).
    /// Existence lives with the owning collaborator; the core only
    /// rejects non-positive ids.
    pub fn normalized_external_id(&self, reference: Option<i64>) -> Option<i64> {
        reference.filter(|id| *id > 0)
    }
}
