//! Explicit permission rule repository.

use sqlx::PgPool;

use folio_core::error::{AppError, ErrorKind};
use folio_core::result::AppResult;
use folio_entity::node::{NodeKind, NodeRef};
use folio_entity::permission::{PermissionRule, RuleEntry};

/// Repository for per-node permission overrides.
///
/// Writes are replace-only: a node's rule set is swapped atomically,
/// never patched row by row.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    /// Create a new rule repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All explicit rules attached to a node.
    pub async fn find_for_node(&self, node: NodeRef) -> AppResult<Vec<PermissionRule>> {
        sqlx::query_as::<_, PermissionRule>(
            "SELECT * FROM node_permissions WHERE node_id = $1 AND node_kind = $2 ORDER BY id",
        )
        .bind(node.id)
        .bind(node.kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find rules", e))
    }

    /// All explicit rules attached to any of the given nodes. Ids can
    /// collide across kinds, so rows are re-matched against the exact
    /// (id, kind) pairs after the fetch.
    pub async fn find_for_nodes(&self, refs: &[NodeRef]) -> AppResult<Vec<PermissionRule>> {
        let mut rules = Vec::new();
        for kind in NodeKind::ALL {
            let ids: Vec<i64> = refs
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            let mut rows = sqlx::query_as::<_, PermissionRule>(
                "SELECT * FROM node_permissions \
                 WHERE node_kind = $1 AND node_id = ANY($2) ORDER BY id",
            )
            .bind(kind)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find rules", e))?;
            rules.append(&mut rows);
        }
        Ok(rules)
    }

    /// Replace a node's entire rule set atomically.
    pub async fn replace_for_node(
        &self,
        node: NodeRef,
        entries: &[RuleEntry],
    ) -> AppResult<Vec<PermissionRule>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin rule replace", e)
        })?;

        sqlx::query("DELETE FROM node_permissions WHERE node_id = $1 AND node_kind = $2")
            .bind(node.id)
            .bind(node.kind)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear rules", e)
            })?;

        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            let rule = sqlx::query_as::<_, PermissionRule>(
                "INSERT INTO node_permissions \
                 (node_id, node_kind, role_id, action, grant_all, grant_own) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
            )
            .bind(node.id)
            .bind(node.kind)
            .bind(entry.role_id)
            .bind(entry.action)
            .bind(entry.grant_all)
            .bind(entry.grant_own)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert rule", e)
            })?;
            stored.push(rule);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rule replace", e)
        })?;

        Ok(stored)
    }

    /// Remove all rules from a node, reverting it to pure inheritance.
    pub async fn clear_for_node(&self, node: NodeRef) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM node_permissions WHERE node_id = $1 AND node_kind = $2")
                .bind(node.id)
                .bind(node.kind)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to clear rules", e)
                })?;
        Ok(result.rows_affected())
    }
}
