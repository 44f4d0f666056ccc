use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::claims::TokenPurpose;

/// One issued session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub access: TokenPurpose,
    pub token: String,
}

impl AuthToken {
    pub fn auth(token: impl Into<String>) -> Self {
        Self {
            access: TokenPurpose::Auth,
            token: token.into(),
        }
    }
}

/// User record in the store. Never serialized directly, see `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub email: String,                // user email
    pub password_hash: String,        // Argon2 hash
    #[sqlx(skip)]
    pub tokens: Vec<AuthToken>,       // live sessions, oldest first
    pub created_at: OffsetDateTime,   // creation timestamp
}
