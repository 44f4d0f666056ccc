use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose tag carried by a token. Only `auth` tokens exist today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Auth,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Auth => "auth",
        }
    }
}

/// JWT payload binding a user to a purpose. No `exp`: sessions end on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,              // user ID
    pub access: TokenPurpose,   // token purpose
    pub iat: usize,             // issued at (unix timestamp)
    pub jti: Uuid,              // per-session nonce
    pub iss: String,            // issuer
    pub aud: String,            // audience
}
