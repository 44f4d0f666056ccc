use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::StoreError;
use crate::todos::repo_types::{Todo, TodoPatch};

/// Persistence for to-do items. Every lookup is filtered by `(id, creator)`.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, creator: Uuid, text: &str) -> Result<Todo, StoreError>;
    /// All items owned by `creator`, in insertion order.
    async fn find_by_creator(&self, creator: Uuid) -> Result<Vec<Todo>, StoreError>;
    async fn find_one(&self, id: Uuid, creator: Uuid) -> Result<Option<Todo>, StoreError>;
    /// Atomically apply `patch` and return the updated item.
    async fn find_one_and_update(
        &self,
        id: Uuid,
        creator: Uuid,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>, StoreError>;
    /// Atomically delete and return the removed item.
    async fn find_one_and_remove(&self, id: Uuid, creator: Uuid) -> Result<Option<Todo>, StoreError>;
}

#[async_trait]
impl TodoStore for PgStore {
    async fn insert(&self, creator: Uuid, text: &str) -> Result<Todo, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (id, creator, text)
            VALUES ($1, $2, $3)
            RETURNING id, text, completed, completed_at, creator
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(creator)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn find_by_creator(&self, creator: Uuid) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, text, completed, completed_at, creator
            FROM todos
            WHERE creator = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_one(&self, id: Uuid, creator: Uuid) -> Result<Option<Todo>, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, text, completed, completed_at, creator
            FROM todos
            WHERE id = $1 AND creator = $2
            "#,
        )
        .bind(id)
        .bind(creator)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn find_one_and_update(
        &self,
        id: Uuid,
        creator: Uuid,
        patch: &TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
               SET text = COALESCE($3, text),
                   completed = $4,
                   completed_at = $5
             WHERE id = $1 AND creator = $2
            RETURNING id, text, completed, completed_at, creator
            "#,
        )
        .bind(id)
        .bind(creator)
        .bind(patch.text.as_deref())
        .bind(patch.completed)
        .bind(patch.completed_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn find_one_and_remove(&self, id: Uuid, creator: Uuid) -> Result<Option<Todo>, StoreError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            DELETE FROM todos
             WHERE id = $1 AND creator = $2
            RETURNING id, text, completed, completed_at, creator
            "#,
        )
        .bind(id)
        .bind(creator)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }
}
