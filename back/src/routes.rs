use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use moss_api::{Envelope, Todo, TodoPatch};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::store::{StoreError, TodoStore};

pub type SharedStore = Arc<dyn TodoStore>;

pub fn router() -> Router<SharedStore> {
    let todos = Router::new()
        .route("/", get(get_todos).post(create_todo))
        .route("/:id", get(get_todo).put(update_todo).delete(delete_todo));

    Router::new()
        .route("/", get(index))
        .nest("/api/todos", todos)
        .fallback(not_found)
}

enum ApiError {
    Store(StoreError),
    Body(JsonRejection),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self {
            ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, Envelope::error("Todo not found"))
            }
            ApiError::Store(StoreError::Validation(messages)) => {
                (StatusCode::BAD_REQUEST, Envelope::error(messages))
            }
            ApiError::Store(StoreError::Database(err)) => {
                error!("database error: {err}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error("Server Error"),
                )
            }
            ApiError::Body(rejection) => {
                error!("malformed request body: {rejection}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error("Server Error"),
                )
            }
        };

        (status, Json(envelope)).into_response()
    }
}

// A string that does not parse as an id cannot name any stored todo.
fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::NotFound)
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to the moss API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> (StatusCode, Json<Envelope<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::error("Route not found")),
    )
}

async fn get_todos(
    State(store): State<SharedStore>,
) -> Result<Json<Envelope<Vec<Todo>>>, ApiError> {
    let todos = store.list().await?;
    Ok(Json(Envelope::list(todos)))
}

async fn get_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Todo>>, ApiError> {
    let todo = store.get(parse_id(&id)?).await?;
    Ok(Json(Envelope::data(todo)))
}

async fn create_todo(
    State(store): State<SharedStore>,
    body: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Todo>>), ApiError> {
    let Json(fields) = body?;
    let todo = store.create(fields).await?;

    info!(
        id = %todo.id,
        title = %todo.title,
        "created todo"
    );

    Ok((StatusCode::CREATED, Json(Envelope::data(todo))))
}

async fn update_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    body: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<Json<Envelope<Todo>>, ApiError> {
    let Json(fields) = body?;
    let todo = store.update(parse_id(&id)?, fields).await?;

    info!(
        id = %todo.id,
        completed = todo.completed,
        "updated todo"
    );

    Ok(Json(Envelope::data(todo)))
}

async fn delete_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
    store.delete(parse_id(&id)?).await?;

    info!(%id, "deleted todo");

    Ok(Json(Envelope::data(json!({}))))
}
