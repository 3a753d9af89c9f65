//! In-memory backend for tests and single-process scenarios.
//!
//! [`InMemoryApi`] holds the "server side" list of one entity kind and
//! answers collaborator calls from it. Failures and latency can be
//! injected per call, which is how the store's error and race handling is
//! exercised without a network.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use super::{ApiError, FetchAll, SessionApi};
use crate::lifecycle::{resulting_status, ActionOutcome, SessionAction, TransitionAction};
use crate::model::{
    Classe, Entity, ExamResult, NewSession, Session, SessionStatus, SessionUpdate, Student,
    Subject, Teacher,
};

struct ApiState<E> {
    records: Vec<E>,
    failures: VecDeque<ApiError>,
    delays: VecDeque<Duration>,
    calls: HashMap<&'static str, usize>,
}

/// In-memory collaborator for one entity kind.
///
/// Features:
/// - Clone-friendly via `Arc` (clones share the same records)
/// - `fail_next` queues an error returned by the next call, whatever it is
/// - `delay_next` makes the next call settle late; its answer is computed
///   at call time, so a delayed listing reflects the records *when it was
///   requested*
/// - Per-operation call counters
///
/// ## Example
///
/// ```ignore
/// let api = InMemoryApi::with_records(vec![student]);
/// api.fail_next(ApiError::http(500, "database unavailable"));
/// assert!(api.fetch_all().await.is_err());
/// assert_eq!(api.fetch_all().await.unwrap().len(), 1);
/// ```
pub struct InMemoryApi<E> {
    state: Arc<Mutex<ApiState<E>>>,
}

impl<E> Clone for InMemoryApi<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E: Entity> Default for InMemoryApi<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryApi<E> {
    /// Create an empty in-memory collaborator.
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a collaborator serving `records`.
    pub fn with_records(records: Vec<E>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ApiState {
                records,
                failures: VecDeque::new(),
                delays: VecDeque::new(),
                calls: HashMap::new(),
            })),
        }
    }

    /// Replace the server-side list.
    pub fn set_records(&self, records: Vec<E>) {
        self.state().records = records;
    }

    /// Snapshot of the server-side list.
    pub fn records(&self) -> Vec<E> {
        self.state().records.clone()
    }

    /// Append a record server-side.
    pub fn insert(&self, record: E) {
        self.state().records.push(record);
    }

    /// Server-side record with `id`, if any.
    pub fn get(&self, id: i64) -> Option<E> {
        self.state().records.iter().find(|r| r.id() == id).cloned()
    }

    /// Make the next call (of any kind) fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        self.state().failures.push_back(error);
    }

    /// Make the next call (of any kind) settle after `delay`.
    pub fn delay_next(&self, delay: Duration) {
        self.state().delays.push_back(delay);
    }

    /// How many times `op` was called (e.g. "fetch_all", "change_status").
    pub fn calls(&self, op: &str) -> usize {
        self.state().calls.get(op).copied().unwrap_or(0)
    }

    fn state(&self) -> MutexGuard<'_, ApiState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T, ApiError>
    where
        T: Send,
        F: FnOnce(&mut ApiState<E>) -> Result<T, ApiError> + Send,
    {
        let (outcome, delay) = {
            let mut state = self.state();
            *state.calls.entry(op).or_default() += 1;
            let delay = state.delays.pop_front();
            let outcome = match state.failures.pop_front() {
                Some(err) => Err(err),
                None => f(&mut state),
            };
            (outcome, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

impl<E: Entity> FetchAll<E> for InMemoryApi<E> {
    async fn fetch_all(&self) -> Result<Vec<E>, ApiError> {
        self.call("fetch_all", |state| Ok(state.records.clone()))
            .await
    }
}

fn find_session(state: &mut ApiState<Session>, id: i64) -> Result<&mut Session, ApiError> {
    state
        .records
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or(ApiError::NotFound {
            kind: Session::KIND,
            id,
        })
}

/// Server-side session rules: ids and join codes are assigned on create,
/// status changes follow the legal-action table, and an active session
/// cannot be edited or deleted.
impl SessionApi for InMemoryApi<Session> {
    async fn get_by_id(&self, id: i64) -> Result<Session, ApiError> {
        self.call("get_by_id", |state| find_session(state, id).map(|s| s.clone()))
            .await
    }

    async fn create(&self, payload: &NewSession) -> Result<Session, ApiError> {
        self.call("create", |state| {
            if payload.ends_at <= payload.starts_at {
                return Err(ApiError::http(
                    422,
                    "The end time must be after the start time.",
                ));
            }
            let id = state.records.iter().map(|s| s.id).max().unwrap_or(0) + 1;
            let now = Utc::now();
            let session = Session {
                id,
                quiz_id: payload.quiz_id,
                title: payload.title.clone(),
                teacher_id: None,
                classe_id: payload.classe_id,
                status: SessionStatus::Scheduled,
                starts_at: payload.starts_at,
                ends_at: payload.ends_at,
                session_code: Some(format!("EV{:04}-Q{}", id, payload.quiz_id)),
                created_at: Some(now),
                updated_at: Some(now),
            };
            state.records.push(session.clone());
            Ok(session)
        })
        .await
    }

    async fn update(&self, id: i64, payload: &SessionUpdate) -> Result<Session, ApiError> {
        self.call("update", |state| {
            let session = find_session(state, id)?;
            if session.status != SessionStatus::Scheduled {
                return Err(ApiError::http(422, "Only scheduled sessions can be edited."));
            }
            payload.apply_to(session);
            session.updated_at = Some(Utc::now());
            Ok(session.clone())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.call("delete", |state| {
            let session = find_session(state, id)?;
            if session.status == SessionStatus::Active {
                return Err(ApiError::http(409, "An active session cannot be deleted."));
            }
            state.records.retain(|s| s.id != id);
            Ok(())
        })
        .await
    }

    async fn change_status(&self, id: i64, action: TransitionAction) -> Result<Session, ApiError> {
        self.call("change_status", |state| {
            let session = find_session(state, id)?;
            match resulting_status(session.status, SessionAction::from(action)) {
                Some(ActionOutcome::Status(next)) => {
                    session.status = next;
                    session.updated_at = Some(Utc::now());
                    Ok(session.clone())
                }
                _ => Err(ApiError::http(
                    422,
                    format!("Cannot {} a {} session.", action, session.status),
                )),
            }
        })
        .await
    }
}

/// One in-memory collaborator per entity kind, usable wherever a full
/// backend is expected (e.g. [`AppContext`](crate::AppContext)).
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    pub students: InMemoryApi<Student>,
    pub teachers: InMemoryApi<Teacher>,
    pub subjects: InMemoryApi<Subject>,
    pub classes: InMemoryApi<Classe>,
    pub sessions: InMemoryApi<Session>,
    pub results: InMemoryApi<ExamResult>,
}

impl InMemoryBackend {
    /// Create a backend with an empty collaborator per kind.
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! delegate_fetch_all {
    ($($field:ident: $ty:ty),+ $(,)?) => {
        $(
            impl FetchAll<$ty> for InMemoryBackend {
                fn fetch_all(&self) -> impl Future<Output = Result<Vec<$ty>, ApiError>> + Send {
                    FetchAll::<$ty>::fetch_all(&self.$field)
                }
            }
        )+
    };
}

delegate_fetch_all!(
    students: Student,
    teachers: Teacher,
    subjects: Subject,
    classes: Classe,
    sessions: Session,
    results: ExamResult,
);

impl SessionApi for InMemoryBackend {
    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<Session, ApiError>> + Send {
        self.sessions.get_by_id(id)
    }

    fn create(
        &self,
        payload: &NewSession,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        self.sessions.create(payload)
    }

    fn update(
        &self,
        id: i64,
        payload: &SessionUpdate,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        self.sessions.update(id, payload)
    }

    fn delete(&self, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.sessions.delete(id)
    }

    fn change_status(
        &self,
        id: i64,
        action: TransitionAction,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        self.sessions.change_status(id, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn new_session() -> NewSession {
        let starts_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        NewSession {
            quiz_id: 9,
            title: Some("Networks final".into()),
            classe_id: Some(2),
            starts_at,
            ends_at: starts_at + ChronoDuration::hours(2),
        }
    }

    #[tokio::test]
    async fn injected_failure_applies_to_next_call_only() {
        let api: InMemoryApi<Session> = InMemoryApi::new();
        api.fail_next(ApiError::http(503, "maintenance"));

        assert_eq!(
            api.fetch_all().await,
            Err(ApiError::http(503, "maintenance"))
        );
        assert_eq!(api.fetch_all().await, Ok(vec![]));
        assert_eq!(api.calls("fetch_all"), 2);
    }

    #[tokio::test]
    async fn create_assigns_id_code_and_scheduled_status() {
        let api: InMemoryApi<Session> = InMemoryApi::new();
        let first = api.create(&new_session()).await.unwrap();
        let second = api.create(&new_session()).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, SessionStatus::Scheduled);
        assert_eq!(first.session_code.as_deref(), Some("EV0001-Q9"));
        assert_eq!(api.records().len(), 2);
    }

    #[tokio::test]
    async fn create_rejects_inverted_window() {
        let api: InMemoryApi<Session> = InMemoryApi::new();
        let mut payload = new_session();
        payload.ends_at = payload.starts_at;
        let err = api.create(&payload).await.unwrap_err();
        assert_eq!(err.status_code(), Some(422));
        assert!(api.records().is_empty());
    }

    #[tokio::test]
    async fn status_changes_follow_the_table() {
        let api: InMemoryApi<Session> = InMemoryApi::new();
        let session = api.create(&new_session()).await.unwrap();

        let err = api
            .change_status(session.id, TransitionAction::Complete)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Cannot complete a scheduled session.");

        let active = api
            .change_status(session.id, TransitionAction::Activate)
            .await
            .unwrap();
        assert_eq!(active.status, SessionStatus::Active);

        let err = api.delete(session.id).await.unwrap_err();
        assert_eq!(err.status_code(), Some(409));

        let done = api
            .change_status(session.id, TransitionAction::Complete)
            .await
            .unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        api.delete(session.id).await.unwrap();
        assert!(api.get(session.id).is_none());
    }

    #[tokio::test]
    async fn backend_delegates_to_the_right_kind() {
        let backend = InMemoryBackend::new();
        backend.sessions.create(&new_session()).await.unwrap();

        let sessions = FetchAll::<Session>::fetch_all(&backend).await.unwrap();
        let students = FetchAll::<Student>::fetch_all(&backend).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(students.is_empty());
    }
}
