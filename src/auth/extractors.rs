use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::repo_types::User;
use super::services::session_from_token;
use crate::{error::AppError, state::AppState};

pub const AUTH_HEADER: HeaderName = HeaderName::from_static("x-auth");

/// Authenticated caller, placed in request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    /// Raw token the request came in with; logout revokes exactly this one.
    pub token: String,
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(&AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
}

/// Rejects the request with a uniform 401 unless `x-auth` carries a live
/// session token.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = header_token(req.headers()).map(str::to_owned) else {
        warn!("missing x-auth header");
        return Err(AppError::Unauthorized);
    };

    let user = session_from_token(&state, &token).await.map_err(|e| {
        warn!(error = %e, "session lookup failed");
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(Session { user, token });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_token_from_x_auth() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_token(&headers), None);
        headers.insert(AUTH_HEADER, HeaderValue::from_static(""));
        assert_eq!(header_token(&headers), None);
        headers.insert(AUTH_HEADER, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(header_token(&headers), Some("abc.def.ghi"));
    }
}
