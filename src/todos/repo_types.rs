use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// To-do item as stored and as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<i64>, // ms since epoch, set only while completed
    #[serde(rename = "_creator")]
    pub creator: Uuid,
}

/// Fields written by an update. `text: None` keeps the stored text; the
/// completion pair is always overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub completed: bool,
    pub completed_at: Option<i64>,
}
