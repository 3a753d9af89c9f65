use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an evaluation session.
///
/// `paused` exists in the backend enumeration but nothing moves a session
/// into or out of it; see [`legal_actions`](crate::lifecycle::legal_actions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses offer no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled sitting of a quiz for a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub quiz_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub classe_id: Option<i64>,
    pub status: SessionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Join token generated server-side. Opaque to the client.
    #[serde(default)]
    pub session_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

crate::impl_entity!(Session, "sessions");

impl Session {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Payload for `POST /sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub quiz_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classe_id: Option<i64>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Payload for `PUT /sessions/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classe_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl SessionUpdate {
    /// Apply the present fields to `session`.
    pub fn apply_to(&self, session: &mut Session) {
        if let Some(title) = &self.title {
            session.title = Some(title.clone());
        }
        if let Some(classe_id) = self.classe_id {
            session.classe_id = Some(classe_id);
        }
        if let Some(starts_at) = self.starts_at {
            session.starts_at = starts_at;
        }
        if let Some(ends_at) = self.ends_at {
            session.ends_at = ends_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entity;

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "id": 7,
            "quiz_id": 3,
            "status": "scheduled",
            "starts_at": "2024-05-01T08:00:00Z",
            "ends_at": "2024-05-01T10:00:00Z",
            "session_code": "QX7-22A",
            "created_at": "2024-04-20T12:00:00Z"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.id(), 7);
        assert_eq!(session.status, SessionStatus::Scheduled);
        assert_eq!(session.session_code.as_deref(), Some("QX7-22A"));
        assert!(session.created_at().is_some());
        assert!(session.updated_at().is_none());
        assert_eq!(Session::KIND, "sessions");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(SessionStatus::Cancelled).unwrap(),
            serde_json::json!("cancelled")
        );
        assert!(SessionStatus::Completed.is_terminal());
        assert!(!SessionStatus::Paused.is_terminal());
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut session: Session = serde_json::from_value(serde_json::json!({
            "id": 1, "quiz_id": 1, "status": "scheduled", "title": "Midterm",
            "starts_at": "2024-05-01T08:00:00Z", "ends_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        let update = SessionUpdate {
            classe_id: Some(4),
            ..Default::default()
        };
        update.apply_to(&mut session);
        assert_eq!(session.classe_id, Some(4));
        assert_eq!(session.title.as_deref(), Some("Midterm"));
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({ "classe_id": 4 }));
    }
}
