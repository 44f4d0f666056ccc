use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    routing::get,
    Extension, Json, Router,
};
use tracing::instrument;

use super::dto::{CreateTodoRequest, TodoResponse, TodosResponse, UpdateTodoRequest};
use super::services;
use crate::{auth::extractors::Session, error::AppError, state::AppState};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).delete(delete_todo).patch(update_todo),
        )
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let Json(body) = payload?;
    let todo = services::create(&state, session.user.id, &body.text).await?;
    Ok(Json(TodoResponse { todo }))
}

#[instrument(skip_all, fields(user_id = %session.user.id))]
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<TodosResponse>, AppError> {
    let todos = services::list_for_user(&state, session.user.id).await?;
    Ok(Json(TodosResponse { todos }))
}

#[instrument(skip_all, fields(user_id = %session.user.id, todo_id = %id))]
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = services::get_by_id(&state, session.user.id, &id).await?;
    Ok(Json(TodoResponse { todo }))
}

#[instrument(skip_all, fields(user_id = %session.user.id, todo_id = %id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = services::delete_by_id(&state, session.user.id, &id).await?;
    Ok(Json(TodoResponse { todo }))
}

#[instrument(skip_all, fields(user_id = %session.user.id, todo_id = %id))]
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TodoResponse>, AppError> {
    // Unknown ids are a 404 even when the body is unreadable.
    services::parse_id(&id)?;
    let changes = UpdateTodoRequest::from_body(is_json(&headers), &body)?;
    let todo = services::update_by_id(&state, session.user.id, &id, changes).await?;
    Ok(Json(TodoResponse { todo }))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}
