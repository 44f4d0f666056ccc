pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::{auth::extractors::require_session, state::AppState};
use axum::{middleware, Router};

pub fn router(state: AppState) -> Router<AppState> {
    handlers::todo_routes().route_layer(middleware::from_fn_with_state(state, require_session))
}
