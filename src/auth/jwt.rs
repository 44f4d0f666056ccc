use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenPurpose};
use crate::{config::JwtConfig, state::AppState};

/// Token verification failure. Deliberately carries no reason.
#[derive(Debug, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidToken;

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    /// Sign an `auth` token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            access: TokenPurpose::Auth,
            iat: now.unix_timestamp() as usize,
            jti: Uuid::new_v4(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    /// Malformed, tampered, foreign and wrong-purpose tokens all fail the same way.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation()).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            InvalidToken
        })?;
        if data.claims.access != TokenPurpose::Auth {
            return Err(InvalidToken);
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        })
    }

    #[test]
    fn issue_and_verify_auth_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.access, TokenPurpose::Auth);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn back_to_back_tokens_differ() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let user_id = Uuid::new_v4();
        let a = keys.issue(user_id).expect("issue");
        let b = keys.issue(user_id).expect("issue");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_malformed_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not-a-jwt").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4()).expect("issue");
        let other = keys.issue(Uuid::new_v4()).expect("issue");
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        // Swap in the other user's payload but keep the original signature.
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert!(keys.verify(&forged).is_err());
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let good = make_keys("same-iss-secret", "iss", "aud");
        let bad = make_keys("another-secret", "iss", "aud");
        let token = bad.issue(Uuid::new_v4()).expect("issue");
        assert!(good.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4()).expect("issue");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_purpose() {
        #[derive(Serialize)]
        struct OtherClaims<'a> {
            sub: Uuid,
            access: &'a str,
            iat: usize,
            jti: Uuid,
            iss: &'a str,
            aud: &'a str,
        }
        let keys = make_keys("dev-secret", "iss", "aud");
        let claims = OtherClaims {
            sub: Uuid::new_v4(),
            access: "refresh",
            iat: 0,
            jti: Uuid::new_v4(),
            iss: "iss",
            aud: "aud",
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }
}
