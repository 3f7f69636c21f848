//! Postgres-backed identity store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | IdentityStoreError |
//! |------------|--------------------|
//! | Database (any code) | `Storage` |
//! | PoolClosed | `Storage` |
//! | Row decode failure | `Storage` |
//!
//! A user whose role row is missing surfaces as `Inconsistent`, not as
//! "user not found".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use storekeep_auth::{Identity, Permission, RoleName};
use storekeep_core::{RoleId, UserId};

use super::{CredentialRecord, IdentityStore, IdentityStoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_identity.sql");

#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: Arc<PgPool>,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with a small pool sized for a single service instance.
    pub async fn connect(database_url: &str) -> Result<Self, IdentityStoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the identity tables when absent. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), IdentityStoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    /// Insert a role with its permissions and one user holding it, unless the
    /// username already exists. Used to seed a first administrator.
    #[instrument(skip(self, password_hash, permissions), err)]
    pub async fn seed_user(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
        role: &RoleName,
        permissions: &[Permission],
    ) -> Result<UserId, IdentityStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("seed_user", e))?;

        if let Some(row) = sqlx::query("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_user", e))?
        {
            let id: uuid::Uuid = row.try_get("id").map_err(|e| map_sqlx_error("seed_user", e))?;
            return Ok(UserId::from_uuid(id));
        }

        let role_row = sqlx::query(
            r#"
            INSERT INTO roles (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(RoleId::new().as_uuid())
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("seed_user", e))?;
        let role_id: uuid::Uuid = role_row
            .try_get("id")
            .map_err(|e| map_sqlx_error("seed_user", e))?;

        for permission in permissions {
            sqlx::query(
                r#"
                WITH p AS (
                    INSERT INTO permissions (id, name) VALUES ($1, $2)
                    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                )
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $3, id FROM p
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(permission.as_str())
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_user", e))?;
        }

        let user_id = UserId::new();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, display_name, password_hash, role_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(username)
        .bind(display_name)
        .bind(password_hash)
        .bind(role_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("seed_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("seed_user", e))?;
        Ok(user_id)
    }
}

#[async_trait::async_trait]
impl IdentityStore for PostgresIdentityStore {
    #[instrument(skip(self), err)]
    async fn find_credential(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, IdentityStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_credential", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e| map_sqlx_error("find_credential", e);
        Ok(Some(CredentialRecord {
            user_id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
            username: row.try_get("username").map_err(decode)?,
            password_hash: row.try_get("password_hash").map_err(decode)?,
            active: row.try_get("is_active").map_err(decode)?,
        }))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn resolve_identity(&self, user_id: UserId) -> Result<Identity, IdentityStoreError> {
        let user = sqlx::query(
            r#"
            SELECT u.id, u.username, u.display_name, u.role_id, r.name AS role_name
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("resolve_identity", e))?
        .ok_or(IdentityStoreError::UserNotFound(user_id))?;

        let decode = |e| map_sqlx_error("resolve_identity", e);
        let role_id: uuid::Uuid = user.try_get("role_id").map_err(decode)?;
        let role_name: Option<String> = user.try_get("role_name").map_err(decode)?;
        let role_name = role_name.ok_or_else(|| IdentityStoreError::Inconsistent {
            user_id,
            reason: format!("role {role_id} missing"),
        })?;

        let permissions: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.name ASC
            "#,
        )
        .bind(role_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("resolve_identity", e))?;

        Ok(Identity::new(
            user_id,
            user.try_get::<String, _>("username").map_err(decode)?,
            user.try_get::<String, _>("display_name").map_err(decode)?,
            RoleId::from_uuid(role_id),
            RoleName::new(role_name),
            permissions.into_iter().map(Permission::new),
        ))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn touch_last_login(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), IdentityStoreError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("touch_last_login", e))?;

        if result.rows_affected() == 0 {
            return Err(IdentityStoreError::UserNotFound(user_id));
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> IdentityStoreError {
    match err {
        sqlx::Error::Database(db_err) => IdentityStoreError::Storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            IdentityStoreError::Storage(format!("connection pool closed in {}", operation))
        }
        other => IdentityStoreError::Storage(format!("{} failed: {}", operation, other)),
    }
}
