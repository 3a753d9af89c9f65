//! AppContext - the composition root.
//!
//! Every store and the event bus are built once, at start-up, and handed
//! to whatever needs them. Nothing is looked up ambiently.

use tracing::info;

use crate::api::{FetchAll, SessionApi};
use crate::bus::{EventBus, EventKind, Subscription};
use crate::lifecycle::SessionLifecycle;
use crate::model::{Classe, ExamResult, Student, Subject, Teacher};
use crate::store::{
    ClasseStore, EntityStore, RefreshOutcome, ResultStore, SessionStore, StudentStore,
    SubjectStore, TeacherStore,
};

/// A backend that can serve every store.
pub trait Backend:
    FetchAll<Student>
    + FetchAll<Teacher>
    + FetchAll<Subject>
    + FetchAll<Classe>
    + FetchAll<ExamResult>
    + SessionApi
    + Clone
    + 'static
{
}

impl<T> Backend for T where
    T: FetchAll<Student>
        + FetchAll<Teacher>
        + FetchAll<Subject>
        + FetchAll<Classe>
        + FetchAll<ExamResult>
        + SessionApi
        + Clone
        + 'static
{
}

/// All stores of the application plus the bus that connects them.
///
/// ## Example
///
/// ```ignore
/// let ctx = AppContext::new(RestClient::new(ApiConfig::from_env()?)?);
/// let _wiring = ctx.wire_refreshes();
/// ctx.refresh_all().await;
///
/// ctx.lifecycle().cancel(session_id).await?;
/// // results refresh on their own through the bus
/// ```
pub struct AppContext<A> {
    pub students: StudentStore<A>,
    pub teachers: TeacherStore<A>,
    pub subjects: SubjectStore<A>,
    pub classes: ClasseStore<A>,
    pub sessions: SessionStore<A>,
    pub results: ResultStore<A>,
    pub bus: EventBus,
}

impl<A: Backend> AppContext<A> {
    pub fn new(api: A) -> Self {
        Self {
            students: EntityStore::new(api.clone()),
            teachers: EntityStore::new(api.clone()),
            subjects: EntityStore::new(api.clone()),
            classes: EntityStore::new(api.clone()),
            sessions: EntityStore::new(api.clone()),
            results: EntityStore::new(api),
            bus: EventBus::new(),
        }
    }

    /// Resolver for session actions, bound to this context's session store and bus.
    pub fn lifecycle(&self) -> SessionLifecycle<A> {
        SessionLifecycle::new(self.sessions.clone(), self.bus.clone())
    }

    /// Cross-store reactions:
    /// - results refresh when a session changes status or is deleted
    ///
    /// Keep the returned subscriptions to undo the wiring.
    pub fn wire_refreshes(&self) -> Vec<Subscription> {
        vec![self.results.refresh_on(
            &self.bus,
            &[EventKind::SessionStatusChanged, EventKind::SessionDeleted],
        )]
    }

    /// Refresh every store concurrently. Returns each kind with its outcome.
    pub async fn refresh_all(&self) -> Vec<(&'static str, RefreshOutcome)> {
        let (students, teachers, subjects, classes, sessions, results) = tokio::join!(
            self.students.refresh(),
            self.teachers.refresh(),
            self.subjects.refresh(),
            self.classes.refresh(),
            self.sessions.refresh(),
            self.results.refresh(),
        );
        vec![
            (self.students.kind(), students),
            (self.teachers.kind(), teachers),
            (self.subjects.kind(), subjects),
            (self.classes.kind(), classes),
            (self.sessions.kind(), sessions),
            (self.results.kind(), results),
        ]
    }

    /// Close every store; responses still in flight are ignored.
    pub fn close(&self) {
        self.students.close();
        self.teachers.close();
        self.subjects.close();
        self.classes.close();
        self.sessions.close();
        self.results.close();
        info!("application context closed");
    }
}
