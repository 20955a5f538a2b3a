use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a client may supply when creating or updating a todo. Unset
/// fields are omitted on the wire, so a partial update leaves them alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// The wrapper around every response body: `{success, count?, data?, error?}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// Either a single message or a list of per-field validation messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Messages(Vec<String>),
}

impl From<&str> for ErrorDetail {
    fn from(message: &str) -> Self {
        Self::Message(message.into())
    }
}

impl From<String> for ErrorDetail {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<Vec<String>> for ErrorDetail {
    fn from(messages: Vec<String>) -> Self {
        Self::Messages(messages)
    }
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data: Some(data),
            error: None,
        }
    }
}

impl<T> Envelope<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(items.len()),
            data: Some(items),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn error(error: impl Into<ErrorDetail>) -> Self {
        Self {
            success: false,
            count: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn envelopes_omit_unused_fields() {
        let ok = serde_json::to_value(Envelope::data(json!({"x": 1}))).unwrap();
        assert_eq!(ok, json!({ "success": true, "data": { "x": 1 } }));

        let list = serde_json::to_value(Envelope::list(vec![1, 2, 3])).unwrap();
        assert_eq!(list, json!({ "success": true, "count": 3, "data": [1, 2, 3] }));

        let err = serde_json::to_value(Envelope::error("Todo not found")).unwrap();
        assert_eq!(err, json!({ "success": false, "error": "Todo not found" }));
    }

    #[test]
    fn error_detail_parses_both_shapes() {
        let single: ErrorDetail = serde_json::from_value(json!("Server Error")).unwrap();
        assert_eq!(single, ErrorDetail::Message("Server Error".into()));

        let many: ErrorDetail = serde_json::from_value(json!(["title is required"])).unwrap();
        assert_eq!(many, ErrorDetail::Messages(vec!["title is required".into()]));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = TodoPatch {
            completed: Some(true),
            ..Default::default()
        };

        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "completed": true }));
    }

    #[test]
    fn todo_uses_camel_case_on_the_wire() {
        let json = json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "title": "Buy milk",
            "completed": false,
            "priority": "high",
            "dueDate": "2026-08-05T12:00:00Z",
            "createdAt": "2026-08-04T09:30:00Z",
            "updatedAt": "2026-08-04T09:30:00Z",
        });

        let todo: Todo = serde_json::from_value(json).unwrap();
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.description, None);
        assert!(todo.due_date.is_some());
    }
}
