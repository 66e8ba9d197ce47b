//! Content node repository.
//!
//! All content reads go through [`ScopedNodes`], which is constructed for
//! exactly one kind and bakes the `kind = $k` predicate into every query
//! it issues. There is no unscoped accessor for content rows, so a page
//! can never be fetched through a book-scoped path. The methods on
//! [`NodeRepository`] itself are structural: parent-pointer lookups and
//! lifecycle batches used by the hierarchy resolver and the builder,
//! each filtered by an exact kind in SQL.

use sqlx::PgPool;

use folio_core::error::{AppError, ErrorKind};
use folio_core::result::AppResult;
use folio_core::types::pagination::{PageRequest, PageResponse};
use folio_entity::node::{
    ContainerData, ContentNode, NewNode, Node, NodeKind, NodePayload, NodeRef, PageData,
};

/// A visibility restriction derived from the materialized joint index.
///
/// Built by the permission applicator from a principal and an action;
/// list queries carrying one only return nodes with a matching granting
/// row. An empty role set matches nothing.
#[derive(Debug, Clone)]
pub struct VisibilityFilter {
    /// The action being performed.
    pub action: folio_entity::permission::Action,
    /// The principal's role ids.
    pub role_ids: Vec<i64>,
    /// The principal's id, for own-scoped grants.
    pub principal_id: i64,
}

/// Repository for content node identity and payload rows.
#[derive(Debug, Clone)]
pub struct NodeRepository {
    pool: PgPool,
}

impl NodeRepository {
    /// Create a new node repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The kind-scoped query surface for content access.
    pub fn scope(&self, kind: NodeKind) -> ScopedNodes {
        ScopedNodes {
            pool: self.pool.clone(),
            kind,
        }
    }

    /// Find an identity row by composite reference, regardless of
    /// soft-delete state. Structural lookups must see trashed nodes so
    /// restore and rebuild walk the same tree the data describes.
    pub async fn find_by_ref(&self, node: NodeRef) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>("SELECT * FROM nodes WHERE id = $1 AND kind = $2")
            .bind(node.id)
            .bind(node.kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node", e))
    }

    /// Find several identity rows by composite reference.
    pub async fn find_by_refs(&self, refs: &[NodeRef]) -> AppResult<Vec<ContentNode>> {
        let mut nodes = Vec::with_capacity(refs.len());
        for kind in NodeKind::ALL {
            let ids: Vec<i64> = refs
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            let mut rows = sqlx::query_as::<_, ContentNode>(
                "SELECT * FROM nodes WHERE kind = $1 AND id = ANY($2)",
            )
            .bind(kind)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find nodes", e))?;
            nodes.append(&mut rows);
        }
        Ok(nodes)
    }

    /// Chapters and pages directly or transitively inside a book.
    pub async fn children_of_book(&self, book_id: i64) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM nodes WHERE book_id = $1 AND kind IN ('chapter', 'page') \
             ORDER BY kind, priority, id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list book children", e)
        })
    }

    /// Pages directly inside a chapter.
    pub async fn pages_of_chapter(&self, chapter_id: i64) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM nodes WHERE chapter_id = $1 AND kind = 'page' \
             ORDER BY priority, id",
        )
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list chapter pages", e)
        })
    }

    /// Fetch the next chunk of identity rows in stable (kind, id) order,
    /// starting after the given cursor. Used by the full rebuild so it
    /// never issues one unbounded query.
    pub async fn fetch_chunk_after(
        &self,
        cursor: Option<NodeRef>,
        limit: u32,
    ) -> AppResult<Vec<ContentNode>> {
        let rows = match cursor {
            Some(after) => {
                sqlx::query_as::<_, ContentNode>(
                    "SELECT * FROM nodes \
                     WHERE kind > $1 OR (kind = $1 AND id > $2) \
                     ORDER BY kind, id LIMIT $3",
                )
                .bind(after.kind)
                .bind(after.id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ContentNode>(
                    "SELECT * FROM nodes ORDER BY kind, id LIMIT $1",
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        };
        rows.map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch chunk", e))
    }

    /// Re-point the pages of a chapter at a new owning book. Runs when a
    /// chapter moves between books, keeping the invariant that a page's
    /// book is always its chapter's book.
    pub async fn reparent_chapter_pages(
        &self,
        chapter_id: i64,
        new_book_id: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE nodes SET book_id = $2, updated_at = NOW() \
             WHERE chapter_id = $1 AND kind = 'page'",
        )
        .bind(chapter_id)
        .bind(new_book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reparent chapter pages", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Total number of identity rows.
    pub async fn count_all(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count nodes", e))?;
        Ok(count as u64)
    }

    /// Soft-delete the given nodes. Rows already marked keep their
    /// original deletion time.
    pub async fn mark_deleted(&self, refs: &[NodeRef]) -> AppResult<u64> {
        let mut affected = 0;
        for kind in NodeKind::ALL {
            let ids: Vec<i64> = refs
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            let result = sqlx::query(
                "UPDATE nodes SET deleted_at = NOW(), updated_at = NOW() \
                 WHERE kind = $1 AND id = ANY($2) AND deleted_at IS NULL",
            )
            .bind(kind)
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to soft-delete nodes", e)
            })?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }

    /// Clear the soft-delete marker on the given nodes.
    pub async fn clear_deleted(&self, refs: &[NodeRef]) -> AppResult<u64> {
        let mut affected = 0;
        for kind in NodeKind::ALL {
            let ids: Vec<i64> = refs
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            let result = sqlx::query(
                "UPDATE nodes SET deleted_at = NULL, updated_at = NOW() \
                 WHERE kind = $1 AND id = ANY($2) AND deleted_at IS NOT NULL",
            )
            .bind(kind)
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to restore nodes", e)
            })?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }

    /// Hard-delete the given nodes and their payloads, rules, joint
    /// rows, and shelf links. Permission and container rows go with the
    /// identity row through cascading foreign keys; page payloads and
    /// shelf links are cleaned up here.
    pub async fn purge(&self, refs: &[NodeRef]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin purge", e)
        })?;

        let page_ids: Vec<i64> = refs
            .iter()
            .filter(|r| r.kind == NodeKind::Page)
            .map(|r| r.id)
            .collect();
        if !page_ids.is_empty() {
            sqlx::query("DELETE FROM node_page_data WHERE page_id = ANY($1)")
                .bind(&page_ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to purge page data", e)
                })?;
        }

        let shelf_ids: Vec<i64> = refs
            .iter()
            .filter(|r| r.kind == NodeKind::Shelf)
            .map(|r| r.id)
            .collect();
        let book_ids: Vec<i64> = refs
            .iter()
            .filter(|r| r.kind == NodeKind::Book)
            .map(|r| r.id)
            .collect();
        if !shelf_ids.is_empty() || !book_ids.is_empty() {
            sqlx::query("DELETE FROM shelf_books WHERE shelf_id = ANY($1) OR book_id = ANY($2)")
                .bind(&shelf_ids)
                .bind(&book_ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to purge shelf links", e)
                })?;
        }

        let mut affected = 0;
        for kind in NodeKind::ALL {
            let ids: Vec<i64> = refs
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.id)
                .collect();
            if ids.is_empty() {
                continue;
            }
            let result = sqlx::query("DELETE FROM nodes WHERE kind = $1 AND id = ANY($2)")
                .bind(kind)
                .bind(&ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to purge nodes", e)
                })?;
            affected += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit purge", e)
        })?;
        Ok(affected)
    }
}

/// The kind-scoped content accessor. Every query it issues carries the
/// scope kind; the predicate is not removable by composition.
#[derive(Debug, Clone)]
pub struct ScopedNodes {
    pool: PgPool,
    kind: NodeKind,
}

impl ScopedNodes {
    /// The kind this accessor is scoped to.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Find a live identity row by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM nodes WHERE id = $1 AND kind = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(self.kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node", e))
    }

    /// Find an identity row by id, including soft-deleted rows.
    pub async fn find_with_deleted(&self, id: i64) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>("SELECT * FROM nodes WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(self.kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node", e))
    }

    /// Find a live identity row by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM nodes WHERE slug = $1 AND kind = $2 AND deleted_at IS NULL",
        )
        .bind(slug)
        .bind(self.kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node by slug", e))
    }

    /// Check whether a slug is taken by another live node of this kind.
    pub async fn slug_in_use(&self, slug: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes \
             WHERE slug = $1 AND kind = $2 AND deleted_at IS NULL AND id != COALESCE($3, -1)",
        )
        .bind(slug)
        .bind(self.kind)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check slug", e))?;
        Ok(count > 0)
    }

    /// List live nodes of this kind, optionally restricted through the
    /// joint permission index.
    pub async fn list(
        &self,
        page: &PageRequest,
        visibility: Option<&VisibilityFilter>,
    ) -> AppResult<PageResponse<ContentNode>> {
        match visibility {
            None => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM nodes WHERE kind = $1 AND deleted_at IS NULL",
                )
                .bind(self.kind)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count nodes", e)
                })?;

                let nodes = sqlx::query_as::<_, ContentNode>(
                    "SELECT * FROM nodes WHERE kind = $1 AND deleted_at IS NULL \
                     ORDER BY priority, name, id LIMIT $2 OFFSET $3",
                )
                .bind(self.kind)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list nodes", e)
                })?;

                Ok(PageResponse::new(nodes, page.page, page.page_size, total as u64))
            }
            Some(filter) => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM nodes \
                     WHERE kind = $1 AND deleted_at IS NULL \
                     AND EXISTS (SELECT 1 FROM joint_permissions jp \
                         WHERE jp.node_id = nodes.id AND jp.node_kind = nodes.kind \
                         AND jp.action = $2 AND jp.role_id = ANY($3) \
                         AND (jp.grant_all OR (jp.grant_own AND jp.owned_by = $4)))",
                )
                .bind(self.kind)
                .bind(filter.action)
                .bind(&filter.role_ids)
                .bind(filter.principal_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count nodes", e)
                })?;

                let nodes = sqlx::query_as::<_, ContentNode>(
                    "SELECT * FROM nodes \
                     WHERE kind = $1 AND deleted_at IS NULL \
                     AND EXISTS (SELECT 1 FROM joint_permissions jp \
                         WHERE jp.node_id = nodes.id AND jp.node_kind = nodes.kind \
                         AND jp.action = $2 AND jp.role_id = ANY($3) \
                         AND (jp.grant_all OR (jp.grant_own AND jp.owned_by = $4))) \
                     ORDER BY priority, name, id LIMIT $5 OFFSET $6",
                )
                .bind(self.kind)
                .bind(filter.action)
                .bind(&filter.role_ids)
                .bind(filter.principal_id)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list nodes", e)
                })?;

                Ok(PageResponse::new(nodes, page.page, page.page_size, total as u64))
            }
        }
    }

    /// List soft-deleted nodes of this kind (the trash view).
    pub async fn list_deleted(&self, page: &PageRequest) -> AppResult<PageResponse<ContentNode>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes WHERE kind = $1 AND deleted_at IS NOT NULL",
        )
        .bind(self.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count trash", e))?;

        let nodes = sqlx::query_as::<_, ContentNode>(
            "SELECT * FROM nodes WHERE kind = $1 AND deleted_at IS NOT NULL \
             ORDER BY deleted_at DESC, id LIMIT $2 OFFSET $3",
        )
        .bind(self.kind)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trash", e))?;

        Ok(PageResponse::new(nodes, page.page, page.page_size, total as u64))
    }

    /// Load the kind payload for an identity row. A missing payload row
    /// is tolerated and reads as empty, so a half-written node from an
    /// interrupted legacy import can still be loaded and repaired by the
    /// next save.
    pub async fn load_payload(&self, node: &ContentNode) -> AppResult<NodePayload> {
        if self.kind.is_container() {
            let data = sqlx::query_as::<_, ContainerData>(
                "SELECT * FROM node_container_data WHERE node_id = $1 AND kind = $2",
            )
            .bind(node.id)
            .bind(self.kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load container data", e)
            })?;
            Ok(NodePayload::Container(
                data.unwrap_or_else(|| ContainerData::empty(node.id, self.kind)),
            ))
        } else {
            let data = sqlx::query_as::<_, PageData>(
                "SELECT * FROM node_page_data WHERE page_id = $1",
            )
            .bind(node.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load page data", e)
            })?;
            Ok(NodePayload::Page(
                data.unwrap_or_else(|| PageData::empty(node.id)),
            ))
        }
    }

    /// Load a full node (identity + payload) by id.
    pub async fn get(&self, id: i64) -> AppResult<Option<Node>> {
        let Some(node) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let payload = self.load_payload(&node).await?;
        Ok(Some(Node::from_parts(node, payload)))
    }

    /// Insert a new node: identity row and payload row as one logical
    /// write. The payload's embedded ids are overwritten with the id the
    /// sequence assigns.
    pub async fn insert(&self, new: &NewNode, payload: &NodePayload) -> AppResult<Node> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin insert", e)
        })?;

        let node = sqlx::query_as::<_, ContentNode>(
            "INSERT INTO nodes (kind, name, slug, book_id, chapter_id, priority, \
                                created_by, updated_by, owned_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $7) RETURNING *",
        )
        .bind(self.kind)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.book_id)
        .bind(new.chapter_id)
        .bind(new.priority)
        .bind(new.actor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert node", e))?;

        let stored = self.write_payload(&mut tx, &node, payload).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit insert", e)
        })?;

        Ok(Node::from_parts(node, stored))
    }

    /// Persist identity and payload changes as one logical write. All
    /// mutable columns are written; the caller works read-modify-write.
    pub async fn save(&self, node: &ContentNode, payload: &NodePayload) -> AppResult<ContentNode> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin save", e)
        })?;

        let updated = sqlx::query_as::<_, ContentNode>(
            "UPDATE nodes SET name = $3, slug = $4, book_id = $5, chapter_id = $6, \
             priority = $7, updated_by = $8, owned_by = $9, updated_at = NOW() \
             WHERE id = $1 AND kind = $2 RETURNING *",
        )
        .bind(node.id)
        .bind(self.kind)
        .bind(&node.name)
        .bind(&node.slug)
        .bind(node.book_id)
        .bind(node.chapter_id)
        .bind(node.priority)
        .bind(node.updated_by)
        .bind(node.owned_by)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update node", e))?
        .ok_or_else(|| AppError::not_found(format!("Node {} not found", node.node_ref())))?;

        self.write_payload(&mut tx, &updated, payload).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit save", e)
        })?;

        Ok(updated)
    }

    /// Upsert the payload row for a node inside an open transaction,
    /// returning the payload as stored (ids normalized).
    async fn write_payload(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        node: &ContentNode,
        payload: &NodePayload,
    ) -> AppResult<NodePayload> {
        match (self.kind.is_container(), payload) {
            (true, NodePayload::Container(data)) => {
                let stored = ContainerData {
                    node_id: node.id,
                    kind: self.kind,
                    ..data.clone()
                };
                sqlx::query(
                    "INSERT INTO node_container_data \
                     (node_id, kind, description, description_html, \
                      default_template_id, cover_image_id, sort_rule_id) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     ON CONFLICT (node_id, kind) DO UPDATE SET \
                     description = EXCLUDED.description, \
                     description_html = EXCLUDED.description_html, \
                     default_template_id = EXCLUDED.default_template_id, \
                     cover_image_id = EXCLUDED.cover_image_id, \
                     sort_rule_id = EXCLUDED.sort_rule_id",
                )
                .bind(stored.node_id)
                .bind(stored.kind)
                .bind(&stored.description)
                .bind(&stored.description_html)
                .bind(stored.default_template_id)
                .bind(stored.cover_image_id)
                .bind(stored.sort_rule_id)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to write container data", e)
                })?;
                Ok(NodePayload::Container(stored))
            }
            (false, NodePayload::Page(data)) => {
                let stored = PageData {
                    page_id: node.id,
                    ..data.clone()
                };
                sqlx::query(
                    "INSERT INTO node_page_data \
                     (page_id, draft, template, revision_count, editor, html, text, markdown) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT (page_id) DO UPDATE SET \
                     draft = EXCLUDED.draft, \
                     template = EXCLUDED.template, \
                     revision_count = EXCLUDED.revision_count, \
                     editor = EXCLUDED.editor, \
                     html = EXCLUDED.html, \
                     text = EXCLUDED.text, \
                     markdown = EXCLUDED.markdown",
                )
                .bind(stored.page_id)
                .bind(stored.draft)
                .bind(stored.template)
                .bind(stored.revision_count)
                .bind(&stored.editor)
                .bind(&stored.html)
                .bind(&stored.text)
                .bind(&stored.markdown)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to write page data", e)
                })?;
                Ok(NodePayload::Page(stored))
            }
            _ => Err(AppError::validation(format!(
                "Payload shape does not match node kind '{}'",
                self.kind
            ))),
        }
    }

    /// Check that a page exists, is live, is flagged as a template, and
    /// is not a draft. Used when validating default-template references.
    pub async fn is_live_template(&self, page_id: i64) -> AppResult<bool> {
        if self.kind != NodeKind::Page {
            return Ok(false);
        }
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes n \
             JOIN node_page_data pd ON pd.page_id = n.id \
             WHERE n.id = $1 AND n.kind = 'page' AND n.deleted_at IS NULL \
             AND pd.template = TRUE AND pd.draft = FALSE",
        )
        .bind(page_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check template", e))?;
        Ok(count > 0)
    }
}
