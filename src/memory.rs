//! In-process store used when no database is configured and by the tests.
//!
//! Each mutation runs under a single write lock, which gives the same
//! per-record atomicity the Postgres backend gets from single statements.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{AuthToken, User};
use crate::error::StoreError;
use crate::todos::repo::TodoStore;
use crate::todos::repo_types::{Todo, TodoPatch};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    todos: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("email {email} already exists")));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            tokens: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_token(&self, user_id: Uuid, token: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.id == user_id && u.tokens.iter().any(|t| t == &AuthToken::auth(token)))
            .cloned())
    }

    async fn push_token(&self, user_id: Uuid, token: &AuthToken) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.tokens.push(token.clone());
        }
        Ok(())
    }

    async fn pull_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.tokens.retain(|t| t.token != token);
        }
        Ok(())
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert(&self, creator: Uuid, text: &str) -> Result<Todo, StoreError> {
        let todo = Todo {
            id: Uuid::new_v4(),
            text: text.to_string(),
            completed: false,
            completed_at: None,
            creator,
        };
        self.todos.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn find_by_creator(&self, creator: Uuid) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos.iter().filter(|t| t.creator == creator).cloned().collect())
    }

    async fn find_one(&self, id: Uuid, creator: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.read().await;
        Ok(todos
            .iter()
            .find(|t| t.id == id && t.creator == creator)
            .cloned())
    }

    async fn find_one_and_update(
        &self,
        id: Uuid,
        creator: Uuid,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        let Some(todo) = todos.iter_mut().find(|t| t.id == id && t.creator == creator) else {
            return Ok(None);
        };
        if let Some(text) = &patch.text {
            todo.text = text.clone();
        }
        todo.completed = patch.completed;
        todo.completed_at = patch.completed_at;
        Ok(Some(todo.clone()))
    }

    async fn find_one_and_remove(&self, id: Uuid, creator: Uuid) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        let pos = todos.iter().position(|t| t.id == id && t.creator == creator);
        Ok(pos.map(|i| todos.remove(i)))
    }
}
