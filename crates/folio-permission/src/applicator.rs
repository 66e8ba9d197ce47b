//! The permission applicator: the only read path for access decisions.
//!
//! Every answer comes from the materialized joint index. If the index is
//! stale or missing rows, that is a builder bug — nothing here falls
//! back to deriving permissions from rules or hierarchy, and a missing
//! row is indistinguishable from an explicit denial.

use folio_core::result::AppResult;
use folio_database::repositories::joint::JointRepository;
use folio_database::repositories::node::VisibilityFilter;
use folio_entity::node::NodeRef;
use folio_entity::permission::Action;
use folio_entity::principal::Principal;

/// Answers visibility questions from the joint permission index.
#[derive(Debug, Clone)]
pub struct PermissionApplicator {
    joint: JointRepository,
}

impl PermissionApplicator {
    /// Create a new applicator.
    pub fn new(joint: JointRepository) -> Self {
        Self { joint }
    }

    /// Build the restriction to attach to a content query: the node must
    /// have a joint row for one of the principal's roles and the action,
    /// granting all-scope access or own-scope access with matching owner.
    ///
    /// A principal with zero roles produces a filter that matches no
    /// rows, so the query fails closed rather than erroring.
    pub fn restrict(&self, principal: &Principal, action: Action) -> VisibilityFilter {
        VisibilityFilter {
            action,
            role_ids: principal.role_ids.clone(),
            principal_id: principal.id,
        }
    }

    /// Point check: may this principal perform the action on this node?
    pub async fn can(
        &self,
        node: NodeRef,
        principal: &Principal,
        action: Action,
    ) -> AppResult<bool> {
        if !principal.has_roles() {
            return Ok(false);
        }
        self.joint
            .any_row_permits(node, &principal.role_ids, action, principal.id)
            .await
    }
}
