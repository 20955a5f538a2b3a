use eyre::{ensure, eyre};
use moss_api::{Envelope, Todo, TodoPatch};
use uuid::Uuid;

/// Typed wrapper over the todo endpoints. Failures collapse into one fixed
/// message per operation; caching and refetching stay with the caller.
#[derive(Clone, Debug)]
pub struct TodoApi {
    client: reqwest::Client,
    base_url: String,
}

impl TodoApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn get_todos(&self) -> eyre::Result<Vec<Todo>> {
        let response = self
            .client
            .get(format!("{}/api/todos", self.base_url))
            .send()
            .await?;

        ensure!(response.status().is_success(), "Failed to fetch todos");

        let envelope: Envelope<Vec<Todo>> = response.json().await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn get_todo(&self, id: Uuid) -> eyre::Result<Todo> {
        let response = self
            .client
            .get(format!("{}/api/todos/{}", self.base_url, id))
            .send()
            .await?;

        ensure!(response.status().is_success(), "Failed to fetch todo");

        let envelope: Envelope<Todo> = response.json().await?;
        envelope.data.ok_or_else(|| eyre!("Failed to fetch todo"))
    }

    pub async fn create_todo(&self, fields: &TodoPatch) -> eyre::Result<Todo> {
        let response = self
            .client
            .post(format!("{}/api/todos", self.base_url))
            .json(fields)
            .send()
            .await?;

        ensure!(response.status().is_success(), "Failed to create todo");

        let envelope: Envelope<Todo> = response.json().await?;
        envelope.data.ok_or_else(|| eyre!("Failed to create todo"))
    }

    pub async fn update_todo(&self, id: Uuid, fields: &TodoPatch) -> eyre::Result<Todo> {
        let response = self
            .client
            .put(format!("{}/api/todos/{}", self.base_url, id))
            .json(fields)
            .send()
            .await?;

        ensure!(response.status().is_success(), "Failed to update todo");

        let envelope: Envelope<Todo> = response.json().await?;
        envelope.data.ok_or_else(|| eyre!("Failed to update todo"))
    }

    pub async fn delete_todo(&self, id: Uuid) -> eyre::Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/todos/{}", self.base_url, id))
            .send()
            .await?;

        ensure!(response.status().is_success(), "Failed to delete todo");

        Ok(())
    }
}
