//! Collaborators - the boundary between the client stores and the backend.
//!
//! Stores only ever need a full listing ([`FetchAll`]). The session
//! lifecycle additionally needs the session endpoints ([`SessionApi`]).
//!
//! ## Implementations
//!
//! ```text
//! ┌──────────────────────────────────┐   ┌────────────────────────────────┐
//! │ InMemoryApi<E> / InMemoryBackend │   │ RestClient (feature "http")    │
//! │ - tests, demos                   │   │ - GET /{kind}?page=N           │
//! │ - failure / latency injection    │   │ - POST /sessions/{id}/{action} │
//! └──────────────────────────────────┘   └────────────────────────────────┘
//! ```

mod error;
mod in_memory;
#[cfg(feature = "http")]
mod rest;

use std::future::Future;

use crate::lifecycle::TransitionAction;
use crate::model::{Entity, NewSession, Session, SessionUpdate};

pub use error::ApiError;
pub use in_memory::{InMemoryApi, InMemoryBackend};
#[cfg(feature = "http")]
pub use rest::RestClient;

/// Full listing of one entity kind.
///
/// Paginated upstreams are flattened by the implementation; the store
/// always receives the complete list.
pub trait FetchAll<E: Entity>: Send + Sync {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<E>, ApiError>> + Send;
}

/// The session endpoints used by the lifecycle resolver.
pub trait SessionApi: FetchAll<Session> {
    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<Session, ApiError>> + Send;

    fn create(
        &self,
        payload: &NewSession,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;

    fn update(
        &self,
        id: i64,
        payload: &SessionUpdate,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;

    fn delete(&self, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Single generic status endpoint keyed by action name. Returns the updated session.
    fn change_status(
        &self,
        id: i64,
        action: TransitionAction,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;
}
