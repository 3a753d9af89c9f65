//! Application events carried by the bus.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of application events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SessionStatusChanged,
    SessionCreated,
    SessionDeleted,
    QuizUpdated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SessionStatusChanged => "SESSION_STATUS_CHANGED",
            EventKind::SessionCreated => "SESSION_CREATED",
            EventKind::SessionDeleted => "SESSION_DELETED",
            EventKind::QuizUpdated => "QUIZ_UPDATED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emitted event. Fields are read-only once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEvent {
    kind: EventKind,
    payload: Value,
    timestamp: DateTime<Utc>,
}

impl AppEvent {
    pub(crate) fn new(kind: EventKind, payload: Value) -> Self {
        Self {
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The `id` field of the payload, if it carries one.
    pub fn entity_id(&self) -> Option<i64> {
        self.payload.get("id").and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_serializes_as_constant_name() {
        assert_eq!(
            serde_json::to_value(EventKind::SessionStatusChanged).unwrap(),
            json!("SESSION_STATUS_CHANGED")
        );
        assert_eq!(EventKind::QuizUpdated.to_string(), "QUIZ_UPDATED");
    }

    #[test]
    fn entity_id_reads_payload() {
        let event = AppEvent::new(EventKind::SessionDeleted, json!({ "id": 12 }));
        assert_eq!(event.entity_id(), Some(12));
        assert_eq!(AppEvent::new(EventKind::QuizUpdated, json!(null)).entity_id(), None);
    }
}
