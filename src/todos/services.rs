use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{clean_text, UpdateTodoRequest};
use super::repo_types::Todo;
use crate::error::AppError;
use crate::state::AppState;

/// A path id that is not a UUID can never match; it is reported as NotFound
/// without asking the store.
pub fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| {
        debug!(%id, "malformed todo id");
        AppError::NotFound
    })
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub async fn create(state: &AppState, user_id: Uuid, text: &str) -> Result<Todo, AppError> {
    let text = clean_text(text)?;
    let todo = state.todos.insert(user_id, &text).await?;
    info!(%user_id, todo_id = %todo.id, "todo created");
    Ok(todo)
}

pub async fn list_for_user(state: &AppState, user_id: Uuid) -> Result<Vec<Todo>, AppError> {
    Ok(state.todos.find_by_creator(user_id).await?)
}

pub async fn get_by_id(state: &AppState, user_id: Uuid, id: &str) -> Result<Todo, AppError> {
    let id = parse_id(id)?;
    state
        .todos
        .find_one(id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete_by_id(state: &AppState, user_id: Uuid, id: &str) -> Result<Todo, AppError> {
    let id = parse_id(id)?;
    let todo = state
        .todos
        .find_one_and_remove(id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(%user_id, todo_id = %todo.id, "todo deleted");
    Ok(todo)
}

pub async fn update_by_id(
    state: &AppState,
    user_id: Uuid,
    id: &str,
    changes: UpdateTodoRequest,
) -> Result<Todo, AppError> {
    let id = parse_id(id)?;
    let patch = changes.into_patch(now_ms())?;
    state
        .todos
        .find_one_and_update(id, user_id, &patch)
        .await?
        .ok_or(AppError::NotFound)
}
