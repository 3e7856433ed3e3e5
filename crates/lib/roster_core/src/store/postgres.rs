//! PostgreSQL-backed [`UserStore`].
//!
//! Email uniqueness is enforced by the `users_email_key` unique index, so a
//! racing insert or update surfaces as a unique violation and maps to
//! [`StoreError::EmailConflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::auth::{NewUser, Role, UserPatch, UserRecord};
use crate::uuid::uuidv7;

const USER_COLUMNS: &str = "id, email, name, password_hash, role::text, created_at, updated_at";

type UserRow = (
    Uuid,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn into_record(row: UserRow) -> Result<UserRecord, StoreError> {
    let (id, email, name, password_hash, role, created_at, updated_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Db(sqlx::Error::Decode(Box::new(e))))?;
    Ok(UserRecord {
        id,
        email,
        name,
        password_hash,
        role,
        created_at,
        updated_at,
    })
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::EmailConflict,
        _ => StoreError::Db(e),
    }
}

/// [`UserStore`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_record).unwrap_or(Err(StoreError::NotFound))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_record).unwrap_or(Err(StoreError::NotFound))
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5::user_role, now(), now()) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        into_record(row)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
               email = COALESCE($2, email), \
               name = COALESCE($3, name), \
               password_hash = COALESCE($4, password_hash), \
               role = COALESCE($5::user_role, role), \
               updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.email)
        .bind(patch.name)
        .bind(patch.password_hash)
        .bind(patch.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;
        row.map(into_record).unwrap_or(Err(StoreError::NotFound))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(into_record).collect()
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
