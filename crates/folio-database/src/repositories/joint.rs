//! Materialized joint permission repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use folio_core::error::{AppError, ErrorKind};
use folio_core::result::AppResult;
use folio_entity::node::NodeRef;
use folio_entity::permission::{Action, JointPermission};

/// Rows inserted per batched INSERT statement.
const INSERT_BATCH: usize = 500;

/// Repository for the derived (node, role, action) permission index.
#[derive(Debug, Clone)]
pub struct JointRepository {
    pool: PgPool,
}

impl JointRepository {
    /// Create a new joint permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace the full row sets for a group of nodes in one
    /// transaction. When a `lock_root` is given, a Postgres advisory
    /// transaction lock keyed by that node is taken first, serializing
    /// rebuilds of the same subtree while unrelated subtrees proceed.
    ///
    /// Each node's rows are deleted and re-inserted inside the single
    /// transaction, so readers never observe a partially replaced node.
    pub async fn replace_for_nodes(
        &self,
        lock_root: Option<NodeRef>,
        per_node: &[(NodeRef, Vec<JointPermission>)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin index replace", e)
        })?;

        if let Some(root) = lock_root {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(subtree_lock_key(root))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to take subtree lock", e)
                })?;
        }

        for (node, _) in per_node {
            sqlx::query(
                "DELETE FROM joint_permissions WHERE node_id = $1 AND node_kind = $2",
            )
            .bind(node.id)
            .bind(node.kind)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear index rows", e)
            })?;
        }

        let rows: Vec<&JointPermission> =
            per_node.iter().flat_map(|(_, rows)| rows.iter()).collect();
        for chunk in rows.chunks(INSERT_BATCH) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO joint_permissions \
                 (node_id, node_kind, role_id, action, grant_all, grant_own, owned_by) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.node_id)
                    .push_bind(row.node_kind)
                    .push_bind(row.role_id)
                    .push_bind(row.action)
                    .push_bind(row.grant_all)
                    .push_bind(row.grant_own)
                    .push_bind(row.owned_by);
            });
            builder.build().execute(&mut *tx).await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert index rows", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit index replace", e)
        })
    }

    /// The stored row for an exact (node, role, action) key.
    pub async fn find(
        &self,
        node: NodeRef,
        role_id: i64,
        action: Action,
    ) -> AppResult<Option<JointPermission>> {
        sqlx::query_as::<_, JointPermission>(
            "SELECT * FROM joint_permissions \
             WHERE node_id = $1 AND node_kind = $2 AND role_id = $3 AND action = $4",
        )
        .bind(node.id)
        .bind(node.kind)
        .bind(role_id)
        .bind(action)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find index row", e))
    }

    /// All stored rows for a node, every role and action.
    pub async fn find_for_node(&self, node: NodeRef) -> AppResult<Vec<JointPermission>> {
        sqlx::query_as::<_, JointPermission>(
            "SELECT * FROM joint_permissions \
             WHERE node_id = $1 AND node_kind = $2 ORDER BY role_id, action",
        )
        .bind(node.id)
        .bind(node.kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load index rows", e))
    }

    /// The point check behind `can`: does any row for one of the given
    /// roles grant the action to this principal on this node?
    pub async fn any_row_permits(
        &self,
        node: NodeRef,
        role_ids: &[i64],
        action: Action,
        principal_id: i64,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM joint_permissions \
             WHERE node_id = $1 AND node_kind = $2 AND action = $3 AND role_id = ANY($4) \
             AND (grant_all OR (grant_own AND owned_by = $5))",
        )
        .bind(node.id)
        .bind(node.kind)
        .bind(action)
        .bind(role_ids)
        .bind(principal_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check index", e))?;
        Ok(count > 0)
    }
}

/// Advisory lock key for a subtree root. The kind lands in the high bits
/// so the key stays unique even though ids collide across kinds.
fn subtree_lock_key(node: NodeRef) -> i64 {
    ((node.kind as i64 + 1) << 56) | (node.id & 0x00FF_FFFF_FFFF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_entity::node::NodeKind;

    #[test]
    fn test_lock_keys_distinct_across_kinds() {
        let book = subtree_lock_key(NodeRef::new(7, NodeKind::Book));
        let chapter = subtree_lock_key(NodeRef::new(7, NodeKind::Chapter));
        assert_ne!(book, chapter);
    }
}
