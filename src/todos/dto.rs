use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::repo_types::{Todo, TodoPatch};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub text: String,
}

/// Body of `PATCH /todos/:id`. Only these two fields are read; anything else
/// in the payload is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub completed: Option<bool>,
}

/// Non-boolean values are treated as absent rather than rejected.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

/// Scalars are cast to their string form; arrays and objects are rejected.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(_) => Err(D::Error::custom("text must be a string")),
    }
}

impl UpdateTodoRequest {
    /// Read a PATCH body. A body that is empty or not sent as JSON counts as
    /// `{}`; a JSON body that does not parse is a validation error.
    pub fn from_body(is_json: bool, body: &[u8]) -> Result<Self, AppError> {
        if !is_json || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|_| AppError::validation("Invalid todo body"))
    }

    /// Derive the stored fields. `completed: true` stamps `completed_at` with
    /// `now_ms`; every other case resets the pair to `(false, null)`.
    pub fn into_patch(self, now_ms: i64) -> Result<TodoPatch, AppError> {
        let text = match self.text {
            Some(t) => Some(clean_text(&t)?),
            None => None,
        };
        let (completed, completed_at) = match self.completed {
            Some(true) => (true, Some(now_ms)),
            _ => (false, None),
        };
        Ok(TodoPatch {
            text,
            completed,
            completed_at,
        })
    }
}

pub(crate) fn clean_text(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Todo text is required"));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodosResponse {
    pub todos: Vec<Todo>,
}
