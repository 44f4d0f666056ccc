use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{AuthToken, User};
use crate::error::{AppError, StoreError};
use crate::state::AppState;
use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Create a user and open its first session. Returns the user and the token.
pub async fn register(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(User, String), AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(AppError::validation(format!("{email} is not a valid email")));
    }
    check_password(password)?;

    let hash = hash_password(password)?;
    let mut user = match state.users.insert(&email, &hash).await {
        Ok(u) => u,
        Err(StoreError::Conflict(_)) => {
            warn!("email already registered");
            return Err(AppError::validation("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let token = issue_session(state, &mut user).await?;
    info!(user_id = %user.id, "user registered");
    Ok((user, token))
}

/// Look up a user by credentials. Unknown email and wrong password are
/// indistinguishable to the caller.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!("login unknown email");
            return Err(AppError::Authentication);
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Authentication);
    }
    Ok(user)
}

/// Resolve a presented token to the user that currently holds it.
pub async fn session_from_token(state: &AppState, token: &str) -> Result<User, AppError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|_| AppError::Authentication)?;

    match state.users.find_by_token(claims.sub, token).await? {
        Some(user) => Ok(user),
        None => {
            debug!(user_id = %claims.sub, "token not held by user, likely revoked");
            Err(AppError::Authentication)
        }
    }
}

/// Sign a new auth token, append it to the user's sessions and persist it.
pub async fn issue_session(state: &AppState, user: &mut User) -> Result<String, AppError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.issue(user.id)?;
    let entry = AuthToken::auth(token.clone());
    state.users.push_token(user.id, &entry).await?;
    user.tokens.push(entry);
    Ok(token)
}

/// Drop the session carrying exactly `token`. Absent tokens are ignored.
pub async fn revoke_session(state: &AppState, user: &User, token: &str) -> Result<(), AppError> {
    state.users.pull_token(user.id, token).await?;
    info!(user_id = %user.id, "session revoked");
    Ok(())
}

/// Replace the user's credential. The digest is only recomputed when the new
/// password differs from the one it currently encodes.
pub async fn change_password(
    state: &AppState,
    mut user: User,
    new_password: &str,
) -> Result<User, AppError> {
    check_password(new_password)?;

    if verify_password(new_password, &user.password_hash) {
        debug!(user_id = %user.id, "password unchanged; keeping digest");
        return Ok(user);
    }

    let hash = hash_password(new_password)?;
    state.users.set_password_hash(user.id, &hash).await?;
    user.password_hash = hash;
    info!(user_id = %user.id, "password changed");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("u@test.com"));
        assert!(!is_valid_email("u@test"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
        assert_eq!(normalize_email("  U@Test.COM "), "u@test.com");
    }

    #[tokio::test]
    async fn register_issues_a_usable_token() {
        let state = AppState::fake();
        let (user, token) = register(&state, "u@test.com", "secret1").await.expect("register");
        assert!(!token.is_empty());
        assert_eq!(user.tokens, vec![AuthToken::auth(token.clone())]);
        assert_ne!(user.password_hash, "secret1");

        let resolved = session_from_token(&state, &token).await.expect("session");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let state = AppState::fake();
        let err = register(&state, "nope", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = register(&state, "u@test.com", "12345").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_taken_email_every_time() {
        let state = AppState::fake();
        register(&state, "u@test.com", "secret1").await.expect("first");
        for _ in 0..2 {
            let err = register(&state, "U@test.com", "secret2").await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn authenticate_failures_look_the_same() {
        let state = AppState::fake();
        register(&state, "u@test.com", "secret1").await.expect("register");

        let wrong = authenticate(&state, "u@test.com", "wrong-pass").await.unwrap_err();
        let unknown = authenticate(&state, "x@test.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong, AppError::Authentication));
        assert!(matches!(unknown, AppError::Authentication));
        assert_eq!(wrong.to_string(), unknown.to_string());

        let user = authenticate(&state, "u@test.com", "secret1").await.expect("login");
        assert_eq!(user.email, "u@test.com");
    }

    #[tokio::test]
    async fn revoked_token_no_longer_resolves() {
        let state = AppState::fake();
        let (mut user, first) = register(&state, "u@test.com", "secret1").await.expect("register");
        let second = issue_session(&state, &mut user).await.expect("second session");

        revoke_session(&state, &user, &first).await.expect("revoke");
        assert!(matches!(
            session_from_token(&state, &first).await.unwrap_err(),
            AppError::Authentication
        ));
        let still = session_from_token(&state, &second).await.expect("other session lives");
        assert_eq!(still.id, user.id);

        // Revoking twice is fine.
        revoke_session(&state, &user, &first).await.expect("revoke again");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let state = AppState::fake();
        let err = session_from_token(&state, "garbage").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication));
    }

    #[tokio::test]
    async fn token_updates_leave_digest_alone() {
        let state = AppState::fake();
        let (mut user, token) = register(&state, "u@test.com", "secret1").await.expect("register");
        let digest = user.password_hash.clone();

        issue_session(&state, &mut user).await.expect("issue");
        revoke_session(&state, &user, &token).await.expect("revoke");

        let stored = state
            .users
            .find_by_email("u@test.com")
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(stored.password_hash, digest);
    }

    #[tokio::test]
    async fn change_password_rehashes_only_on_change() {
        let state = AppState::fake();
        let (user, _) = register(&state, "u@test.com", "secret1").await.expect("register");
        let digest = user.password_hash.clone();

        let same = change_password(&state, user, "secret1").await.expect("same password");
        assert_eq!(same.password_hash, digest);

        let changed = change_password(&state, same, "secret2").await.expect("new password");
        assert_ne!(changed.password_hash, digest);
        authenticate(&state, "u@test.com", "secret2").await.expect("login with new");
        assert!(authenticate(&state, "u@test.com", "secret1").await.is_err());

        let err = change_password(&state, changed, "123").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
