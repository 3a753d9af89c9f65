//! Error type for lifecycle operations.

use crate::api::ApiError;
use crate::model::SessionStatus;

use super::SessionAction;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The session is not in the local store, so its status is unknown.
    #[error("session {0} is not loaded")]
    NotFound(i64),
    /// Rejected locally by the legal-action table; no backend call was made.
    #[error("cannot {action} session {id}: it is {status}")]
    Illegal {
        id: i64,
        status: SessionStatus,
        action: SessionAction,
    },
    /// The backend rejected the call; local state is unchanged.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl LifecycleError {
    /// Text for the initiating screen. Server messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            LifecycleError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
