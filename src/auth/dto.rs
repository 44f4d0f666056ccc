use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;

/// Body of `POST /users` and `POST /users/login`. Other fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}
