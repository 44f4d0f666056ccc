use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{AuthToken, User};
use crate::db::PgStore;
use crate::error::StoreError;

/// Persistence for user records and their session tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A taken email yields `StoreError::Conflict`.
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// The user `user_id`, provided it currently holds `token` as an `auth` token.
    async fn find_by_token(&self, user_id: Uuid, token: &str) -> Result<Option<User>, StoreError>;
    async fn push_token(&self, user_id: Uuid, token: &AuthToken) -> Result<(), StoreError>;
    /// Remove every entry equal to `token`. Removing an absent token is a no-op.
    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError>;
    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

impl PgStore {
    async fn load_tokens(&self, user_id: Uuid) -> Result<Vec<AuthToken>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT token
            FROM user_tokens
            WHERE user_id = $1 AND access = 'auth'
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(token,)| AuthToken::auth(token)).collect())
    }

    async fn with_tokens(&self, user: Option<User>) -> Result<Option<User>, StoreError> {
        match user {
            Some(mut u) => {
                u.tokens = self.load_tokens(u.id).await?;
                Ok(Some(u))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        self.with_tokens(user).await
    }

    async fn find_by_token(&self, user_id: Uuid, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.created_at
            FROM users u
            WHERE u.id = $1
              AND EXISTS (
                  SELECT 1 FROM user_tokens t
                  WHERE t.user_id = u.id AND t.access = 'auth' AND t.token = $2
              )
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        self.with_tokens(user).await
    }

    async fn push_token(&self, user_id: Uuid, token: &AuthToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, access, token)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token.access.as_str())
        .bind(&token.token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM user_tokens WHERE user_id = $1 AND token = $2"#)
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
