//! Session lifecycle - which actions are legal for a session, and what they lead to.
//!
//! ```text
//!   scheduled ──activate──▶ active ──complete──▶ completed
//!       │                     │
//!       └──────cancel─────────┴──────cancel────▶ cancelled
//!
//!   paused: present in the status enum, no transition reaches or leaves it
//! ```
//!
//! | status    | legal actions                  |
//! |-----------|--------------------------------|
//! | scheduled | activate, cancel, edit, delete |
//! | active    | complete, cancel               |
//! | paused    | -                              |
//! | completed | delete                         |
//! | cancelled | delete                         |
//!
//! An active session can never be deleted: students may be mid-attempt.

mod error;
mod menu;
mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SessionStatus;

pub use error::LifecycleError;
pub use menu::{action_menu, MenuItem};
pub use resolver::SessionLifecycle;

/// Anything a user can do to a session from its action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Activate,
    Complete,
    Cancel,
    Edit,
    Delete,
}

/// The status-changing subset of [`SessionAction`], each backed by the
/// generic `POST /sessions/{id}/{action}` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionAction {
    Activate,
    Complete,
    Cancel,
}

/// What a legal action does to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The session stays, with this status.
    Status(SessionStatus),
    /// The session is deleted.
    Removed,
}

const SCHEDULED_ACTIONS: &[SessionAction] = &[
    SessionAction::Activate,
    SessionAction::Cancel,
    SessionAction::Edit,
    SessionAction::Delete,
];
const ACTIVE_ACTIONS: &[SessionAction] = &[SessionAction::Complete, SessionAction::Cancel];
const TERMINAL_ACTIONS: &[SessionAction] = &[SessionAction::Delete];

/// The legal-action table.
pub fn legal_actions(status: SessionStatus) -> &'static [SessionAction] {
    match status {
        SessionStatus::Scheduled => SCHEDULED_ACTIONS,
        SessionStatus::Active => ACTIVE_ACTIONS,
        SessionStatus::Paused => &[],
        SessionStatus::Completed | SessionStatus::Cancelled => TERMINAL_ACTIONS,
    }
}

pub fn is_legal(status: SessionStatus, action: SessionAction) -> bool {
    legal_actions(status).contains(&action)
}

/// Where `action` takes a session in `status`, or `None` if the action is illegal there.
pub fn resulting_status(status: SessionStatus, action: SessionAction) -> Option<ActionOutcome> {
    if !is_legal(status, action) {
        return None;
    }
    let outcome = match action {
        SessionAction::Activate => ActionOutcome::Status(SessionStatus::Active),
        SessionAction::Complete => ActionOutcome::Status(SessionStatus::Completed),
        SessionAction::Cancel => ActionOutcome::Status(SessionStatus::Cancelled),
        SessionAction::Edit => ActionOutcome::Status(status),
        SessionAction::Delete => ActionOutcome::Removed,
    };
    Some(outcome)
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Activate => "activate",
            SessionAction::Complete => "complete",
            SessionAction::Cancel => "cancel",
            SessionAction::Edit => "edit",
            SessionAction::Delete => "delete",
        }
    }

    /// Whether this action changes the session's status through the status endpoint.
    pub fn as_transition(&self) -> Option<TransitionAction> {
        match self {
            SessionAction::Activate => Some(TransitionAction::Activate),
            SessionAction::Complete => Some(TransitionAction::Complete),
            SessionAction::Cancel => Some(TransitionAction::Cancel),
            SessionAction::Edit | SessionAction::Delete => None,
        }
    }
}

impl TransitionAction {
    /// The action name used in the endpoint path.
    pub fn as_str(&self) -> &'static str {
        SessionAction::from(*self).as_str()
    }
}

impl From<TransitionAction> for SessionAction {
    fn from(action: TransitionAction) -> Self {
        match action {
            TransitionAction::Activate => SessionAction::Activate,
            TransitionAction::Complete => SessionAction::Complete,
            TransitionAction::Cancel => SessionAction::Cancel,
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_STATUSES: [SessionStatus; 5] = [
        SessionStatus::Scheduled,
        SessionStatus::Active,
        SessionStatus::Paused,
        SessionStatus::Completed,
        SessionStatus::Cancelled,
    ];

    fn set(actions: &[SessionAction]) -> HashSet<SessionAction> {
        actions.iter().copied().collect()
    }

    #[test]
    fn active_offers_exactly_complete_and_cancel() {
        assert_eq!(
            set(legal_actions(SessionStatus::Active)),
            set(&[SessionAction::Complete, SessionAction::Cancel])
        );
        assert!(!is_legal(SessionStatus::Active, SessionAction::Edit));
        assert!(!is_legal(SessionStatus::Active, SessionAction::Delete));
    }

    #[test]
    fn scheduled_offers_everything_but_complete() {
        assert_eq!(
            set(legal_actions(SessionStatus::Scheduled)),
            set(&[
                SessionAction::Activate,
                SessionAction::Cancel,
                SessionAction::Edit,
                SessionAction::Delete
            ])
        );
    }

    #[test]
    fn terminal_statuses_only_allow_delete() {
        for status in [SessionStatus::Completed, SessionStatus::Cancelled] {
            assert_eq!(legal_actions(status), &[SessionAction::Delete]);
            assert_eq!(
                resulting_status(status, SessionAction::Delete),
                Some(ActionOutcome::Removed)
            );
        }
    }

    #[test]
    fn paused_is_a_dead_end() {
        assert!(legal_actions(SessionStatus::Paused).is_empty());
        for status in ALL_STATUSES {
            for action in legal_actions(status) {
                assert_ne!(
                    resulting_status(status, *action),
                    Some(ActionOutcome::Status(SessionStatus::Paused))
                );
            }
        }
    }

    #[test]
    fn transitions_land_where_the_table_says() {
        use ActionOutcome::Status;
        assert_eq!(
            resulting_status(SessionStatus::Scheduled, SessionAction::Activate),
            Some(Status(SessionStatus::Active))
        );
        assert_eq!(
            resulting_status(SessionStatus::Scheduled, SessionAction::Edit),
            Some(Status(SessionStatus::Scheduled))
        );
        assert_eq!(
            resulting_status(SessionStatus::Active, SessionAction::Complete),
            Some(Status(SessionStatus::Completed))
        );
        assert_eq!(
            resulting_status(SessionStatus::Active, SessionAction::Cancel),
            Some(Status(SessionStatus::Cancelled))
        );
        assert_eq!(
            resulting_status(SessionStatus::Scheduled, SessionAction::Complete),
            None
        );
    }

    #[test]
    fn transition_names_match_endpoint_segments() {
        assert_eq!(TransitionAction::Activate.as_str(), "activate");
        assert_eq!(
            serde_json::to_value(TransitionAction::Cancel).unwrap(),
            serde_json::json!("cancel")
        );
        assert_eq!(
            SessionAction::Complete.as_transition(),
            Some(TransitionAction::Complete)
        );
        assert_eq!(SessionAction::Delete.as_transition(), None);
    }
}
