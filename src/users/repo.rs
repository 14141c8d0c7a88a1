use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::users::repo_types::{NewUser, User, UserPatch};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("email already exists")]
    DuplicateEmail,
    #[error("storage backend error: {0}")]
    Backend(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        if let sqlx::Error::Database(db_err) = &err {
            if is_unique_violation(db_err.code().as_deref()) {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Backend(err)
    }
}

fn is_unique_violation(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION)
}

/// Persistence of user records. Every method is a single atomic operation
/// against the backing store; email uniqueness is enforced by the store on
/// write, never by a prior read.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i32) -> Result<User, StoreError>;
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: i32, patch: &UserPatch) -> Result<User, StoreError>;
    async fn delete(&self, id: i32) -> Result<(), StoreError>;
    /// Newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, age, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, age, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        // Relies on users_email_key; a duplicate surfaces as 23505.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, age, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, age, is_active, created_at, updated_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.age)
        .bind(new_user.is_active)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = user.id, "user row inserted");
        Ok(user)
    }

    async fn update(&self, id: i32, patch: &UserPatch) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name       = COALESCE($2, name),
                   email      = COALESCE($3, email),
                   age        = CASE WHEN $4 THEN $5 ELSE age END,
                   is_active  = COALESCE($6, is_active),
                   updated_at = GREATEST(NOW(), created_at)
             WHERE id = $1
            RETURNING id, name, email, password_hash, age, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.age.is_some())
        .bind(patch.age.flatten())
        .bind(patch.is_active)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = user.id, "user row updated");
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, age, is_active, created_at, updated_at
            FROM users
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
