use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserStore;
use crate::error::AuthError;
use crate::models::User;

/// [`UserStore`] over the `users` table.
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
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, name: &str, email: &str) -> Result<User, AuthError> {
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}
