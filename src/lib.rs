//! Client-side entity synchronization for the evaluation platform.
//!
//! - [`EntityStore`] caches the backend's list of one entity kind, with a
//!   loading flag and an error slot, and local patch operations.
//! - [`EventBus`] connects stores and screens through typed application events.
//! - [`SessionLifecycle`] gates session actions by status and performs them.
//! - [`AppContext`] builds all of the above once and hands them out.

pub mod api;
pub mod bus;
pub mod config;
mod context;
pub mod lifecycle;
pub mod model;
pub mod store;
mod telemetry;

pub use api::{ApiError, FetchAll, InMemoryApi, InMemoryBackend, SessionApi};
#[cfg(feature = "http")]
pub use api::RestClient;
pub use bus::{AppEvent, EventBus, EventKind, Subscription};
pub use config::{ApiConfig, ConfigError};
pub use context::{AppContext, Backend};
pub use lifecycle::{
    action_menu, is_legal, legal_actions, resulting_status, ActionOutcome, LifecycleError,
    MenuItem, SessionAction, SessionLifecycle, TransitionAction,
};
pub use model::{
    Classe, Entity, ExamResult, NewSession, Session, SessionStatus, SessionUpdate, Student,
    Subject, Teacher,
};
pub use store::{EntityStore, RefreshOutcome};
pub use telemetry::init_tracing;
