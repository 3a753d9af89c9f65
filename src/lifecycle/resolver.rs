//! SessionLifecycle - gated session mutations against the backend.

use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::SessionApi;
use crate::bus::{EventBus, EventKind};
use crate::model::{NewSession, Session, SessionUpdate};
use crate::store::EntityStore;

use super::{
    action_menu, is_legal, legal_actions, LifecycleError, MenuItem, SessionAction,
    TransitionAction,
};

/// Performs session actions for the screens that offer them.
///
/// Every mutating call follows the same order:
/// 1. look up the cached session and check the legal-action table
///    (illegal requests never reach the backend)
/// 2. call the backend
/// 3. only on success, patch the session store and emit the event
///
/// On failure nothing local changes and the error carries the server's
/// message for the initiating screen.
pub struct SessionLifecycle<A> {
    sessions: EntityStore<Session, A>,
    bus: EventBus,
}

impl<A: Clone> Clone for SessionLifecycle<A> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<A: SessionApi> SessionLifecycle<A> {
    /// The resolver reaches the backend through the store's own collaborator.
    pub fn new(sessions: EntityStore<Session, A>, bus: EventBus) -> Self {
        Self { sessions, bus }
    }

    pub fn sessions(&self) -> &EntityStore<Session, A> {
        &self.sessions
    }

    /// Legal actions for a cached session.
    pub fn legal_actions(&self, id: i64) -> Result<&'static [SessionAction], LifecycleError> {
        let session = self.cached(id)?;
        Ok(legal_actions(session.status))
    }

    /// Action menu for a cached session.
    pub fn menu(&self, id: i64) -> Result<Vec<MenuItem>, LifecycleError> {
        let session = self.cached(id)?;
        Ok(action_menu(session.status))
    }

    /// Change a session's status through the backend's status endpoint.
    ///
    /// On success the cached entry is replaced by the entity the backend
    /// returned and `SESSION_STATUS_CHANGED` is emitted with
    /// `{ id, from, to }`.
    pub async fn transition(
        &self,
        id: i64,
        action: TransitionAction,
    ) -> Result<Session, LifecycleError> {
        let current = self.guard(id, action.into())?;

        let updated = self
            .api()
            .change_status(id, action)
            .await
            .map_err(|err| {
                warn!(id, action = %action, error = %err, "session transition rejected");
                LifecycleError::from(err)
            })?;

        if !self.sessions.replace(updated.clone()) {
            debug!(id, "session left the store while transitioning");
        }
        info!(id, action = %action, from = %current.status, to = %updated.status, "session transitioned");
        self.bus.emit(
            EventKind::SessionStatusChanged,
            json!({ "id": id, "from": current.status, "to": updated.status }),
        );
        Ok(updated)
    }

    pub async fn activate(&self, id: i64) -> Result<Session, LifecycleError> {
        self.transition(id, TransitionAction::Activate).await
    }

    pub async fn complete(&self, id: i64) -> Result<Session, LifecycleError> {
        self.transition(id, TransitionAction::Complete).await
    }

    pub async fn cancel(&self, id: i64) -> Result<Session, LifecycleError> {
        self.transition(id, TransitionAction::Cancel).await
    }

    /// Edit a scheduled session. Emits no event; the status does not change.
    pub async fn edit(&self, id: i64, update: &SessionUpdate) -> Result<Session, LifecycleError> {
        self.guard(id, SessionAction::Edit)?;

        let updated = self.api().update(id, update).await.map_err(|err| {
            warn!(id, error = %err, "session edit rejected");
            LifecycleError::from(err)
        })?;

        self.sessions.replace(updated.clone());
        info!(id, "session edited");
        Ok(updated)
    }

    /// Delete a session that is not in progress, then drop it from the store
    /// and emit `SESSION_DELETED` with `{ id }`.
    pub async fn delete(&self, id: i64) -> Result<(), LifecycleError> {
        self.guard(id, SessionAction::Delete)?;

        self.api().delete(id).await.map_err(|err| {
            warn!(id, error = %err, "session delete rejected");
            LifecycleError::from(err)
        })?;

        self.sessions.remove(id);
        info!(id, "session deleted");
        self.bus.emit(EventKind::SessionDeleted, json!({ "id": id }));
        Ok(())
    }

    /// Create a session, prepend it to the store and emit `SESSION_CREATED`
    /// with `{ id, quiz_id }`.
    pub async fn create(&self, payload: &NewSession) -> Result<Session, LifecycleError> {
        let created = self.api().create(payload).await.map_err(|err| {
            warn!(quiz_id = payload.quiz_id, error = %err, "session create rejected");
            LifecycleError::from(err)
        })?;

        self.sessions.add(created.clone());
        info!(id = created.id, quiz_id = created.quiz_id, "session created");
        self.bus.emit(
            EventKind::SessionCreated,
            json!({ "id": created.id, "quiz_id": created.quiz_id }),
        );
        Ok(created)
    }

    fn api(&self) -> &A {
        self.sessions.collaborator()
    }

    fn cached(&self, id: i64) -> Result<Session, LifecycleError> {
        self.sessions.get(id).ok_or(LifecycleError::NotFound(id))
    }

    fn guard(&self, id: i64, action: SessionAction) -> Result<Session, LifecycleError> {
        let session = self.cached(id)?;
        if !is_legal(session.status, action) {
            debug!(id, action = %action, status = %session.status, "illegal session action");
            return Err(LifecycleError::Illegal {
                id,
                status: session.status,
                action,
            });
        }
        Ok(session)
    }
}
