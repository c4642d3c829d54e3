use async_trait::async_trait;

use accessgate_application::{AccessStore, GrantRecord, RoleRecord};
use accessgate_core::{AppError, AppResult, TenantId, UserId};

use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed adapter for role and grant lookups.
///
/// Schema lives in `migrations/`. Grant rows are not unique; duplicates
/// collapse in the query.
#[derive(Clone)]
pub struct PostgresAccessStore {
    pool: PgPool,
}

impl PostgresAccessStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role: String,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl AccessStore for PostgresAccessStore {
    async fn fetch_role(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Option<RoleRecord>> {
        let mut rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT role
            FROM tenant_members
            WHERE tenant_id = $1
                AND user_id = $2
            LIMIT 2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load member role: {error}")))?;

        if rows.len() > 1 {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' has more than one role record in tenant '{tenant_id}'"
            )));
        }

        Ok(rows.pop().map(|row| RoleRecord { role: row.role }))
    }

    async fn fetch_grants(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<GrantRecord>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT permission
            FROM member_permissions
            WHERE tenant_id = $1
                AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load member permissions: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| GrantRecord {
                permission: row.permission,
            })
            .collect())
    }
}
