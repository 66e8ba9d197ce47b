//! The joint permission builder.
//!
//! Walks affected subtrees, resolves effective access per
//! (node, role, action), and replaces rows in the materialized index.
//! Every operation is idempotent: re-running a rebuild over the same
//! scope with unchanged inputs writes identical rows, so interrupted
//! runs are always safe to retry.

use tracing::{debug, info, warn};

use folio_core::result::AppResult;
use folio_database::repositories::joint::JointRepository;
use folio_database::repositories::node::NodeRepository;
use folio_database::repositories::role::RoleRepository;
use folio_database::repositories::rule::RuleRepository;
use folio_entity::node::{ContentNode, NodeRef};
use folio_entity::permission::JointPermission;
use folio_entity::role::RoleCapabilities;

use super::resolve::{RuleSet, resolve_node_rows};
use crate::hierarchy::{HierarchyResolver, NodeArena};

/// Materializes the joint permission index.
#[derive(Debug, Clone)]
pub struct JointPermissionBuilder {
    nodes: NodeRepository,
    rules: RuleRepository,
    roles: RoleRepository,
    joint: JointRepository,
    hierarchy: HierarchyResolver,
    chunk_size: u32,
}

impl JointPermissionBuilder {
    /// Create a new builder.
    pub fn new(
        nodes: NodeRepository,
        rules: RuleRepository,
        roles: RoleRepository,
        joint: JointRepository,
        hierarchy: HierarchyResolver,
        chunk_size: u32,
    ) -> Self {
        Self {
            nodes,
            rules,
            roles,
            joint,
            hierarchy,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Recompute and replace the index rows for exactly one node, for
    /// every role and every action applicable to its kind.
    ///
    /// A node that no longer exists is a no-op: a queued rebuild must
    /// not fail forever because its subject was purged in the meantime.
    pub async fn rebuild_for_node(&self, node_ref: NodeRef) -> AppResult<()> {
        let Some(node) = self.nodes.find_by_ref(node_ref).await? else {
            debug!(node = %node_ref, "Skipping rebuild for missing node");
            return Ok(());
        };

        let roles = self.load_roles().await?;
        let (arena, rules) = self.load_chain_state(&node).await?;
        let rows = resolve_node_rows(&node, &arena, &rules, &roles);

        let lock_root = self.hierarchy.lock_root_of(&node).await?;
        self.joint
            .replace_for_nodes(Some(lock_root), &[(node_ref, rows)])
            .await?;

        debug!(node = %node_ref, "Rebuilt joint permissions for node");
        Ok(())
    }

    /// Recompute the index for a node and its full structural subtree.
    /// Used after move, explicit-rule change, and delete/restore.
    ///
    /// The whole replacement runs under one advisory lock keyed by the
    /// chain root (the owning book for chapters and pages), so rebuilds
    /// of the same book serialize while unrelated subtrees proceed.
    pub async fn rebuild_for_subtree(&self, node_ref: NodeRef) -> AppResult<()> {
        let Some(node) = self.nodes.find_by_ref(node_ref).await? else {
            debug!(node = %node_ref, "Skipping subtree rebuild for missing node");
            return Ok(());
        };

        let roles = self.load_roles().await?;
        let subtree = self.hierarchy.subtree_of(&node).await?;
        let (arena, rules) = self.load_batch_state(&subtree).await?;

        let per_node: Vec<(NodeRef, Vec<JointPermission>)> = subtree
            .iter()
            .map(|n| (n.node_ref(), resolve_node_rows(n, &arena, &rules, &roles)))
            .collect();

        let lock_root = self.hierarchy.lock_root_of(&node).await?;
        self.joint
            .replace_for_nodes(Some(lock_root), &per_node)
            .await?;

        debug!(
            node = %node_ref,
            subtree_size = subtree.len(),
            "Rebuilt joint permissions for subtree"
        );
        Ok(())
    }

    /// Rebuild the entire index from scratch, in bounded chunks.
    ///
    /// Each chunk commits in its own transaction, so an interrupted run
    /// leaves every already-processed node fully replaced and is safe to
    /// re-run from the start. Returns the number of nodes processed.
    pub async fn rebuild_all(&self) -> AppResult<u64> {
        let total = self.nodes.count_all().await?;
        info!(total, chunk_size = self.chunk_size, "Starting full rebuild");

        let roles = self.load_roles().await?;
        let mut cursor: Option<NodeRef> = None;
        let mut processed: u64 = 0;

        loop {
            let chunk = self.nodes.fetch_chunk_after(cursor, self.chunk_size).await?;
            let Some(last) = chunk.last() else {
                break;
            };
            cursor = Some(last.node_ref());

            let (arena, rules) = self.load_batch_state(&chunk).await?;
            let per_node: Vec<(NodeRef, Vec<JointPermission>)> = chunk
                .iter()
                .map(|n| (n.node_ref(), resolve_node_rows(n, &arena, &rules, &roles)))
                .collect();

            self.joint.replace_for_nodes(None, &per_node).await?;
            processed += chunk.len() as u64;
            debug!(processed, total, "Full rebuild progress");
        }

        if processed < total {
            // Nodes created mid-run are picked up by their own triggered
            // rebuilds; this is informational only.
            warn!(processed, total, "Full rebuild saw fewer nodes than counted");
        }
        info!(processed, "Full rebuild complete");
        Ok(processed)
    }

    /// Load every role's capability table.
    pub async fn load_roles(&self) -> AppResult<Vec<RoleCapabilities>> {
        let roles = self.roles.find_all().await?;
        let capabilities = self.roles.capabilities_for_all().await?;
        Ok(roles
            .iter()
            .map(|r| RoleCapabilities::new(r.id, &capabilities))
            .collect())
    }

    /// Arena and rules covering one node plus its ancestor chain.
    async fn load_chain_state(&self, node: &ContentNode) -> AppResult<(NodeArena, RuleSet)> {
        let mut arena = NodeArena::new();
        for ancestor in self.hierarchy.ancestors_of(node).await? {
            arena.insert(ancestor);
        }
        arena.insert(node.clone());

        let refs: Vec<NodeRef> = arena.chain_of(node.node_ref());
        let rules = RuleSet::from_rules(self.rules.find_for_nodes(&refs).await?);
        Ok((arena, rules))
    }

    /// Arena and rules covering a batch of nodes plus every ancestor the
    /// batch reaches outside itself.
    async fn load_batch_state(&self, batch: &[ContentNode]) -> AppResult<(NodeArena, RuleSet)> {
        let mut arena = NodeArena::from_nodes(batch.iter().cloned());

        // Parent pointers can leave the batch (chunked full rebuild, or
        // a subtree whose root has ancestors). Fetch until closed.
        loop {
            let missing = arena.missing_parents();
            if missing.is_empty() {
                break;
            }
            let fetched = self.nodes.find_by_refs(&missing).await?;
            if fetched.is_empty() {
                // Dangling parent pointers: resolve with what we have.
                warn!(count = missing.len(), "Dangling parent references in batch");
                break;
            }
            for node in fetched {
                arena.insert(node);
            }
        }

        let refs: Vec<NodeRef> = {
            let mut all = Vec::with_capacity(arena.len());
            for node in batch {
                all.extend(arena.chain_of(node.node_ref()));
            }
            all.sort_by_key(|r| (r.kind as u8, r.id));
            all.dedup();
            all
        };
        let rules = RuleSet::from_rules(self.rules.find_for_nodes(&refs).await?);
        Ok((arena, rules))
    }
}
