use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use moss_api::{Priority, Todo, TodoPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo not found")]
    NotFound,
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Todo, StoreError>;
    async fn create(&self, fields: TodoPatch) -> Result<Todo, StoreError>;
    async fn update(&self, id: Uuid, fields: TodoPatch) -> Result<Todo, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

// BSON datetimes carry millisecond precision, so timestamps are assigned
// at that resolution and survive a round trip through the database intact.
fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(now)
}

fn validate_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation(vec![String::from(
            "title is required",
        )]));
    }

    Ok(())
}

fn build(fields: TodoPatch) -> Result<Todo, StoreError> {
    let title = fields.title.unwrap_or_default();
    validate_title(&title)?;

    let created = now();

    Ok(Todo {
        id: Uuid::new_v4(),
        title,
        description: fields.description,
        completed: fields.completed.unwrap_or(false),
        priority: fields.priority.unwrap_or_default(),
        due_date: fields.due_date,
        created_at: created,
        updated_at: created,
    })
}

// Applies only the supplied fields, then re-validates the merged todo.
fn merge(mut todo: Todo, fields: TodoPatch) -> Result<Todo, StoreError> {
    if let Some(title) = fields.title {
        todo.title = title;
    }

    if let Some(description) = fields.description {
        todo.description = Some(description);
    }

    if let Some(completed) = fields.completed {
        todo.completed = completed;
    }

    if let Some(priority) = fields.priority {
        todo.priority = priority;
    }

    if let Some(due_date) = fields.due_date {
        todo.due_date = Some(due_date);
    }

    validate_title(&todo.title)?;
    todo.updated_at = now();

    Ok(todo)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    completed: bool,
    priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<bson::DateTime>,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<Todo> for TodoDocument {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            priority: todo.priority,
            due_date: todo.due_date.map(bson::DateTime::from_chrono),
            created_at: bson::DateTime::from_chrono(todo.created_at),
            updated_at: bson::DateTime::from_chrono(todo.updated_at),
        }
    }
}

impl From<TodoDocument> for Todo {
    fn from(document: TodoDocument) -> Self {
        Self {
            id: document.id,
            title: document.title,
            description: document.description,
            completed: document.completed,
            priority: document.priority,
            due_date: document.due_date.map(|date| date.to_chrono()),
            created_at: document.created_at.to_chrono(),
            updated_at: document.updated_at.to_chrono(),
        }
    }
}

#[derive(Clone)]
pub struct MongoStore {
    todos: Collection<TodoDocument>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let todos = client.database(database).collection("todos");

        Ok(Self { todos })
    }
}

#[async_trait]
impl TodoStore for MongoStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let cursor = self
            .todos
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;

        let documents: Vec<TodoDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Todo::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Todo, StoreError> {
        let document = self.todos.find_one(doc! { "_id": id.to_string() }).await?;
        document.map(Todo::from).ok_or(StoreError::NotFound)
    }

    async fn create(&self, fields: TodoPatch) -> Result<Todo, StoreError> {
        let todo = build(fields)?;
        self.todos.insert_one(TodoDocument::from(todo.clone())).await?;

        Ok(todo)
    }

    async fn update(&self, id: Uuid, fields: TodoPatch) -> Result<Todo, StoreError> {
        let current = self.get(id).await?;
        let merged = merge(current, fields)?;

        // Last write wins if two updates race, the later replacement sticks.
        let result = self
            .todos
            .replace_one(
                doc! { "_id": id.to_string() },
                TodoDocument::from(merged.clone()),
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(merged)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let deleted = self
            .todos
            .find_one_and_delete(doc! { "_id": id.to_string() })
            .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

/// Insertion-ordered in-memory store, used by the test suite and `--memory`
/// runs. A stable sort over insertion order breaks creation-time ties.
#[derive(Debug, Default)]
pub struct MemoryStore {
    todos: Mutex<Vec<Todo>>,
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.lock().await;

        let mut todos = todos.clone();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(todos)
    }

    async fn get(&self, id: Uuid) -> Result<Todo, StoreError> {
        let todos = self.todos.lock().await;

        (todos.iter())
            .find(|todo| todo.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, fields: TodoPatch) -> Result<Todo, StoreError> {
        let todo = build(fields)?;

        let mut todos = self.todos.lock().await;
        todos.push(todo.clone());

        Ok(todo)
    }

    async fn update(&self, id: Uuid, fields: TodoPatch) -> Result<Todo, StoreError> {
        let mut todos = self.todos.lock().await;

        let index = (todos.iter())
            .position(|todo| todo.id == id)
            .ok_or(StoreError::NotFound)?;

        let merged = merge(todos[index].clone(), fields)?;
        todos[index] = merged.clone();

        Ok(merged)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut todos = self.todos.lock().await;

        let index = (todos.iter())
            .position(|todo| todo.id == id)
            .ok_or(StoreError::NotFound)?;

        todos.remove(index);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::time;

    fn titled(title: &str) -> TodoPatch {
        TodoPatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_id_timestamps_and_defaults() {
        let store = MemoryStore::default();

        let todo = store.create(titled("Buy milk")).await.unwrap();

        assert!(!todo.id.is_nil());
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
        assert_eq!(todo.priority, Priority::Medium);
        assert_eq!(todo.description, None);
        assert_eq!(todo.due_date, None);
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_missing_or_empty_title() {
        let store = MemoryStore::default();

        for fields in [TodoPatch::default(), titled(""), titled("   ")] {
            match store.create(fields).await {
                Err(StoreError::Validation(messages)) => {
                    assert_eq!(messages, vec![String::from("title is required")]);
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let store = MemoryStore::default();

        let created = store
            .create(TodoPatch {
                title: Some("Water plants".into()),
                description: Some("The ones on the balcony".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        time::sleep(Duration::from_millis(5)).await;

        let updated = store
            .update(
                created.id,
                TodoPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Water plants");
        assert_eq!(updated.description.as_deref(), Some("The ones on the balcony"));
        assert!(updated.completed);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        assert_eq!(store.get(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_rejects_empty_title_and_leaves_todo_untouched() {
        let store = MemoryStore::default();

        let created = store.create(titled("Buy milk")).await.unwrap();

        let result = store.update(created.id, titled("")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));

        assert_eq!(store.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_of_absent_id_is_not_found() {
        let store = MemoryStore::default();

        let result = store.update(Uuid::new_v4(), titled("Buy milk")).await;
        assert!(matches!(result, Err(StoreError::NotFound)));

        // no upsert
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryStore::default();

        let todo = store.create(titled("Buy milk")).await.unwrap();

        store.delete(todo.id).await.unwrap();

        assert!(matches!(store.get(todo.id).await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete(todo.id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_shrinks_on_delete() {
        let store = MemoryStore::default();

        let mut ids = Vec::new();
        for title in ["first", "second", "third"] {
            ids.push(store.create(titled(title)).await.unwrap().id);
            time::sleep(Duration::from_millis(5)).await;
        }

        let titles: Vec<_> = (store.list().await.unwrap().into_iter())
            .map(|todo| todo.title)
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);

        store.delete(ids[1]).await.unwrap();

        let titles: Vec<_> = (store.list().await.unwrap().into_iter())
            .map(|todo| todo.title)
            .collect();
        assert_eq!(titles, ["third", "first"]);
    }
}
