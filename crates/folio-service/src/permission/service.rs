//! Permission rule and role management.
//!
//! Rule writes are replace-only and guarded: a change that would leave a
//! node without any role holding full update access is rejected before
//! anything is written. Every accepted change invalidates the node's
//! whole subtree in the materialized index, because inheritance can only
//! be interrupted by a deeper explicit rule.

use tracing::info;

use folio_core::error::AppError;
use folio_core::result::AppResult;
use folio_database::repositories::node::NodeRepository;
use folio_database::repositories::role::RoleRepository;
use folio_database::repositories::rule::RuleRepository;
use folio_entity::node::{NodeKind, NodeRef};
use folio_entity::permission::{Action, Capability, PermissionRule, RuleEntry};
use folio_entity::role::{Role, RoleCapabilities};
use folio_permission::JointPermissionBuilder;
use folio_permission::hierarchy::{HierarchyResolver, NodeArena};
use folio_permission::joint::guard;
use folio_permission::joint::resolve::RuleSet;

use crate::context::RequestContext;

/// Manages explicit node rules and role capability tables.
#[derive(Debug, Clone)]
pub struct PermissionRuleService {
    nodes: NodeRepository,
    rules: RuleRepository,
    roles: RoleRepository,
    hierarchy: HierarchyResolver,
    builder: JointPermissionBuilder,
}

impl PermissionRuleService {
    /// Create a new permission rule service.
    pub fn new(
        nodes: NodeRepository,
        rules: RuleRepository,
        roles: RoleRepository,
        hierarchy: HierarchyResolver,
        builder: JointPermissionBuilder,
    ) -> Self {
        Self {
            nodes,
            rules,
            roles,
            hierarchy,
            builder,
        }
    }

    /// The explicit rules attached to a node.
    pub async fn rules_for(&self, node: NodeRef) -> AppResult<Vec<PermissionRule>> {
        self.rules.find_for_node(node).await
    }

    /// Replace a node's entire rule set. The lockout guard runs against
    /// the pending state first; the node's subtree is rebuilt after the
    /// write commits.
    pub async fn set_rules(
        &self,
        ctx: &RequestContext,
        node_ref: NodeRef,
        entries: Vec<RuleEntry>,
    ) -> AppResult<Vec<PermissionRule>> {
        for entry in &entries {
            if let Some(role_id) = entry.role_id {
                self.roles
                    .find_by_id(role_id)
                    .await?
                    .ok_or_else(|| AppError::validation(format!("Role {role_id} not found")))?;
            }
        }

        self.guard_pending(node_ref, &entries).await?;

        let stored = self.rules.replace_for_node(node_ref, &entries).await?;
        self.builder.rebuild_for_subtree(node_ref).await?;

        info!(
            actor = ctx.actor_id(),
            node = %node_ref,
            rules = stored.len(),
            "Replaced explicit permission rules"
        );
        Ok(stored)
    }

    /// Remove all rules from a node, reverting it and its subtree to
    /// pure inheritance.
    pub async fn clear_rules(&self, ctx: &RequestContext, node_ref: NodeRef) -> AppResult<()> {
        self.guard_pending(node_ref, &[]).await?;

        self.rules.clear_for_node(node_ref).await?;
        self.builder.rebuild_for_subtree(node_ref).await?;

        info!(actor = ctx.actor_id(), node = %node_ref, "Cleared explicit permission rules");
        Ok(())
    }

    /// All roles.
    pub async fn roles(&self) -> AppResult<Vec<Role>> {
        self.roles.find_all().await
    }

    /// Create a role. The index gains rows for the new role on the next
    /// full rebuild, which is triggered here: a role without joint rows
    /// would read as denied everywhere.
    pub async fn create_role(
        &self,
        ctx: &RequestContext,
        display_name: &str,
        system_name: &str,
        capabilities: &[(NodeKind, Action, Capability)],
    ) -> AppResult<Role> {
        let role = self.roles.create(display_name, system_name).await?;
        self.roles.set_capabilities(role.id, capabilities).await?;
        self.builder.rebuild_all().await?;

        info!(actor = ctx.actor_id(), role = role.id, "Created role");
        Ok(role)
    }

    /// Replace a role's default capability table. Defaults feed every
    /// node without an explicit rule, so the whole index is rebuilt.
    pub async fn set_role_capabilities(
        &self,
        ctx: &RequestContext,
        role_id: i64,
        capabilities: &[(NodeKind, Action, Capability)],
    ) -> AppResult<()> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))?;

        // Stripping manager capability follows the same rule as deleting
        // the role: some other role must still be able to administer
        // content afterwards.
        let pending = RoleCapabilities::from_levels(role_id, capabilities.iter().copied());
        if !pending.is_full_manager() {
            let roles = self.builder.load_roles().await?;
            guard::ensure_role_removable(&roles, role_id)?;
        }

        self.roles.set_capabilities(role_id, capabilities).await?;
        self.builder.rebuild_all().await?;

        info!(actor = ctx.actor_id(), role = role_id, "Replaced role capabilities");
        Ok(())
    }

    /// Delete a role. Blocked when it is the last role holding full
    /// update capability across every kind; otherwise its joint rows and
    /// rules vanish with it.
    pub async fn delete_role(&self, ctx: &RequestContext, role_id: i64) -> AppResult<()> {
        let roles = self.builder.load_roles().await?;
        guard::ensure_role_removable(&roles, role_id)?;

        if !self.roles.delete(role_id).await? {
            return Err(AppError::not_found(format!("Role {role_id} not found")));
        }
        info!(actor = ctx.actor_id(), role = role_id, "Deleted role");
        Ok(())
    }

    /// Evaluate the lockout guard for a pending rule replacement.
    async fn guard_pending(&self, node_ref: NodeRef, entries: &[RuleEntry]) -> AppResult<()> {
        let node = self
            .nodes
            .find_by_ref(node_ref)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{node_ref} not found")))?;

        let mut arena = NodeArena::new();
        for ancestor in self.hierarchy.ancestors_of(&node).await? {
            arena.insert(ancestor);
        }
        arena.insert(node.clone());

        let chain = arena.chain_of(node_ref);
        let current = RuleSet::from_rules(self.rules.find_for_nodes(&chain).await?);
        let pending: Vec<PermissionRule> = entries
            .iter()
            .map(|e| PermissionRule {
                id: 0,
                node_id: node_ref.id,
                node_kind: node_ref.kind,
                role_id: e.role_id,
                action: e.action,
                grant_all: e.grant_all,
                grant_own: e.grant_own,
            })
            .collect();
        let with_pending = current.with_replaced(node_ref, pending);

        let roles = self.builder.load_roles().await?;
        guard::ensure_manageable(&node, &arena, &with_pending, &roles)
    }
}
