use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn token(&self) -> String {
        self.headers
            .get("x-auth")
            .and_then(|v| v.to_str().ok())
            .expect("x-auth header present")
            .to_string()
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    match body {
        Some(json) => send_raw(app, method, uri, token, Some("application/json"), json.to_string()).await,
        None => send_raw(app, method, uri, token, None, String::new()).await,
    }
}

/// Send `body` verbatim with an optional content type.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: String,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-auth", token);
    }
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let req = builder.body(Body::from(body)).expect("request builds");

    let res = app.clone().oneshot(req).await.expect("router is infallible");
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    TestResponse { status, headers, body }
}

/// Register `email` and return its first session token.
pub async fn register(app: &Router, email: &str, password: &str) -> String {
    let res = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "register {email}: {}", res.body);
    res.token()
}
