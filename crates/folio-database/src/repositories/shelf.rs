//! Shelf membership repository.

use sqlx::PgPool;

use folio_core::error::{AppError, ErrorKind};
use folio_core::result::AppResult;
use folio_entity::node::{ContentNode, ShelfBook};

/// Repository for the loose shelf <-> book association.
#[derive(Debug, Clone)]
pub struct ShelfRepository {
    pool: PgPool,
}

impl ShelfRepository {
    /// Create a new shelf repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The live books on a shelf, in shelf order.
    pub async fn books_for_shelf(&self, shelf_id: i64) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT n.* FROM nodes n \
             JOIN shelf_books sb ON sb.book_id = n.id \
             WHERE sb.shelf_id = $1 AND n.kind = 'book' AND n.deleted_at IS NULL \
             ORDER BY sb.book_order, n.id",
        )
        .bind(shelf_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list shelf books", e))
    }

    /// Link rows for a shelf, in order.
    pub async fn links_for_shelf(&self, shelf_id: i64) -> AppResult<Vec<ShelfBook>> {
        sqlx::query_as::<_, ShelfBook>(
            "SELECT * FROM shelf_books WHERE shelf_id = $1 ORDER BY book_order, book_id",
        )
        .bind(shelf_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list shelf links", e))
    }

    /// The shelves a book appears on.
    pub async fn shelves_for_book(&self, book_id: i64) -> AppResult<Vec<ContentNode>> {
        sqlx::query_as::<_, ContentNode>(
            "SELECT n.* FROM nodes n \
             JOIN shelf_books sb ON sb.shelf_id = n.id \
             WHERE sb.book_id = $1 AND n.kind = 'shelf' AND n.deleted_at IS NULL \
             ORDER BY n.name, n.id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list book shelves", e))
    }

    /// Replace a shelf's book set atomically, preserving the given order.
    pub async fn replace_books(&self, shelf_id: i64, book_ids: &[i64]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin shelf replace", e)
        })?;

        sqlx::query("DELETE FROM shelf_books WHERE shelf_id = $1")
            .bind(shelf_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear shelf links", e)
            })?;

        for (order, book_id) in book_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO shelf_books (shelf_id, book_id, book_order) VALUES ($1, $2, $3)",
            )
            .bind(shelf_id)
            .bind(book_id)
            .bind(order as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert shelf link", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit shelf replace", e)
        })
    }
}
