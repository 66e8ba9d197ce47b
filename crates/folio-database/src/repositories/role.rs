//! Role repository.

use sqlx::PgPool;

use folio_core::error::{AppError, ErrorKind};
use folio_core::result::AppResult;
use folio_entity::node::NodeKind;
use folio_entity::permission::{Action, Capability};
use folio_entity::role::{Role, RoleCapability};

/// Repository for roles and their default capability tables.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a role by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role", e))
    }

    /// All roles, ordered by id.
    pub async fn find_all(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))
    }

    /// Create a new role with an empty capability table.
    pub async fn create(&self, display_name: &str, system_name: &str) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (display_name, system_name) VALUES ($1, $2) RETURNING *",
        )
        .bind(display_name)
        .bind(system_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("roles_system_name_key") =>
            {
                AppError::conflict(format!("Role '{system_name}' already exists"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create role", e),
        })
    }

    /// All capability rows, for every role. Loaded once per rebuild pass.
    pub async fn capabilities_for_all(&self) -> AppResult<Vec<RoleCapability>> {
        sqlx::query_as::<_, RoleCapability>(
            "SELECT * FROM role_capabilities ORDER BY role_id, kind, action",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load capabilities", e)
        })
    }

    /// Capability rows for one role.
    pub async fn capabilities_for(&self, role_id: i64) -> AppResult<Vec<RoleCapability>> {
        sqlx::query_as::<_, RoleCapability>(
            "SELECT * FROM role_capabilities WHERE role_id = $1 ORDER BY kind, action",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load capabilities", e)
        })
    }

    /// Replace a role's capability table atomically.
    pub async fn set_capabilities(
        &self,
        role_id: i64,
        levels: &[(NodeKind, Action, Capability)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin capability replace", e)
        })?;

        sqlx::query("DELETE FROM role_capabilities WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear capabilities", e)
            })?;

        for (kind, action, level) in levels {
            sqlx::query(
                "INSERT INTO role_capabilities (role_id, kind, action, level) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(role_id)
            .bind(kind)
            .bind(action)
            .bind(level)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert capability", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit capability replace", e)
        })?;
        Ok(())
    }

    /// Delete a role. Capability rows, explicit rules, and joint rows
    /// scoped to the role go with it through cascading foreign keys.
    pub async fn delete(&self, role_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete role", e))?;
        Ok(result.rows_affected() > 0)
    }
}
