pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod state;
pub mod todos;

pub use app::{build_app, serve};
pub use error::AppError;
pub use state::AppState;
