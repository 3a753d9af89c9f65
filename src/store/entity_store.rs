//! EntityStore - cached, observable list of one entity kind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ApiError, FetchAll};
use crate::bus::{EventBus, EventKind, Subscription};
use crate::model::Entity;

/// Result of one [`EntityStore::refresh`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The fetched list replaced the cached one.
    Applied { count: usize },
    /// The fetch failed; the cached list was kept and the error slot set.
    Failed(ApiError),
    /// A newer refresh was issued while this one was in flight; its result was dropped.
    Stale,
    /// The store was closed before the fetch settled; its result was dropped.
    Cancelled,
}

impl RefreshOutcome {
    /// Whether the fetched list replaced the cache.
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { .. })
    }
}

struct StoreState<E> {
    items: Vec<E>,
    loading: bool,
    error: Option<String>,
    /// Token of the most recently issued refresh.
    latest_token: u64,
    revision: u64,
}

struct Shared<E> {
    state: RwLock<StoreState<E>>,
    next_token: AtomicU64,
    cancel: CancellationToken,
    changes: watch::Sender<u64>,
}

/// Cached list of one entity kind, bound to the collaborator that lists it.
///
/// Cloning yields another handle to the same state.
///
/// - `refresh` is the only operation that reaches the backend. It replaces
///   the whole list on success and records an error string on failure;
///   it never returns an error itself.
/// - `add` / `update` / `replace` / `remove` are local patches applied after
///   the caller has already persisted the change.
/// - Entity ids are unique within the list after every operation.
///
/// Overlapping refreshes are resolved "last request wins": each refresh
/// takes a token, and a response whose token is no longer the latest is
/// discarded. After [`close`](Self::close) every in-flight response is
/// discarded.
///
/// ## Example
///
/// ```ignore
/// let students = EntityStore::new(InMemoryApi::with_records(vec![alice]));
/// students.refresh().await;
/// assert_eq!(students.len(), 1);
///
/// let mut changes = students.subscribe();
/// students.remove(alice.id);
/// changes.changed().await?;
/// ```
pub struct EntityStore<E, C> {
    shared: Arc<Shared<E>>,
    collaborator: C,
}

impl<E, C: Clone> Clone for EntityStore<E, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            collaborator: self.collaborator.clone(),
        }
    }
}

impl<E: Entity, C> EntityStore<E, C> {
    /// Create an empty store bound to `collaborator`.
    pub fn new(collaborator: C) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState {
                    items: Vec::new(),
                    loading: false,
                    error: None,
                    latest_token: 0,
                    revision: 0,
                }),
                next_token: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                changes,
            }),
            collaborator,
        }
    }

    /// The entity kind this store caches.
    pub fn kind(&self) -> &'static str {
        E::KIND
    }

    /// The backend collaborator this store refreshes from.
    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Snapshot of the cached list, newest additions first.
    pub fn items(&self) -> Vec<E> {
        self.read().items.clone()
    }

    /// Cached entity with `id`, if any.
    pub fn get(&self, id: i64) -> Option<E> {
        self.read().items.iter().find(|e| e.id() == id).cloned()
    }

    /// Cached entities matching a predicate, in list order.
    pub fn find<F>(&self, predicate: F) -> Vec<E>
    where
        F: Fn(&E) -> bool,
    {
        self.read()
            .items
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Whether an entity with `id` is cached.
    pub fn contains(&self, id: i64) -> bool {
        self.read().items.iter().any(|e| e.id() == id)
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Whether a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Message of the last failed refresh, cleared by the next successful one.
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Counter bumped on every state change.
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Receive the revision every time the store changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }

    // ========================================================================
    // Local mutations
    // ========================================================================

    /// Prepend an entity that the caller has already persisted.
    ///
    /// An existing entry with the same id is dropped first.
    pub fn add(&self, entity: E) {
        let id = entity.id();
        self.mutate(|state| {
            state.items.retain(|e| e.id() != id);
            state.items.insert(0, entity);
        });
    }

    /// Shallow-merge the fields of `partial` into the entity with `id`.
    ///
    /// `partial` must serialize to a JSON object; an `id` key in it is
    /// ignored. Returns `false` (and changes nothing) when no entity matches
    /// or the merged value is not a valid `E`.
    pub fn update<P: Serialize>(&self, id: i64, partial: P) -> bool {
        let patch = match serde_json::to_value(partial) {
            Ok(Value::Object(patch)) => patch,
            Ok(other) => {
                warn!(kind = E::KIND, id, patch = %other, "update patch is not an object");
                return false;
            }
            Err(err) => {
                warn!(kind = E::KIND, id, error = %err, "update patch does not serialize");
                return false;
            }
        };

        let mut state = self.write();
        let Some(index) = state.items.iter().position(|e| e.id() == id) else {
            return false;
        };

        let merged = serde_json::to_value(&state.items[index]).and_then(|current| {
            let mut current = match current {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            for (key, value) in patch {
                if key != "id" {
                    current.insert(key, value);
                }
            }
            serde_json::from_value::<E>(Value::Object(current))
        });

        match merged {
            Ok(entity) => {
                state.items[index] = entity;
                self.touch(&mut state);
                true
            }
            Err(err) => {
                warn!(kind = E::KIND, id, error = %err, "update patch rejected");
                false
            }
        }
    }

    /// Edit the entity with `id` in place.
    ///
    /// Returns `false` if no entity matches. The closure must not change the
    /// entity's id; if it does, the edit is reverted.
    pub fn update_with<F>(&self, id: i64, f: F) -> bool
    where
        F: FnOnce(&mut E),
    {
        let mut state = self.write();
        let Some(entity) = state.items.iter_mut().find(|e| e.id() == id) else {
            return false;
        };

        let original = entity.clone();
        f(entity);
        if entity.id() != id {
            warn!(kind = E::KIND, id, "update_with changed the id; edit reverted");
            *entity = original;
            return false;
        }
        self.touch(&mut state);
        true
    }

    /// Overwrite the entry with the same id as `entity`. No-op if absent.
    pub fn replace(&self, entity: E) -> bool {
        let id = entity.id();
        let mut state = self.write();
        let Some(slot) = state.items.iter_mut().find(|e| e.id() == id) else {
            return false;
        };
        *slot = entity;
        self.touch(&mut state);
        true
    }

    /// Remove the entity with `id`. Returns `true` if it was present.
    pub fn remove(&self, id: i64) -> bool {
        let mut state = self.write();
        let before = state.items.len();
        state.items.retain(|e| e.id() != id);
        if state.items.len() == before {
            return false;
        }
        self.touch(&mut state);
        true
    }

    /// Dismiss the last refresh error without refreshing.
    pub fn clear_error(&self) {
        self.mutate(|state| state.error = None);
    }

    // ========================================================================
    // Scope
    // ========================================================================

    /// Close the store's scope. Responses of in-flight and future refreshes are ignored.
    ///
    /// Cancellation happens under the state lock, so a refresh either starts
    /// before `close` (and is cleared by it) or sees the store closed.
    pub fn close(&self) {
        self.mutate(|state| {
            self.shared.cancel.cancel();
            state.loading = false;
        });
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read(&self) -> RwLockReadGuard<'_, StoreState<E>> {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState<E>> {
        self.shared
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(&self, f: impl FnOnce(&mut StoreState<E>)) {
        let mut state = self.write();
        f(&mut state);
        self.touch(&mut state);
    }

    fn touch(&self, state: &mut StoreState<E>) {
        state.revision += 1;
        self.shared.changes.send_replace(state.revision);
    }

    /// Issue a refresh token, or `None` if the store is closed.
    fn begin_refresh(&self) -> Option<u64> {
        let mut state = self.write();
        if self.is_closed() {
            return None;
        }
        let token = self.shared.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        state.latest_token = token;
        state.loading = true;
        self.touch(&mut state);
        Some(token)
    }

    fn settle(&self, token: u64, result: Result<Vec<E>, ApiError>) -> RefreshOutcome {
        let mut state = self.write();
        if self.is_closed() {
            debug!(kind = E::KIND, token, "refresh ignored: store closed");
            return RefreshOutcome::Cancelled;
        }
        if token != state.latest_token {
            debug!(kind = E::KIND, token, latest = state.latest_token, "discarding stale refresh");
            return RefreshOutcome::Stale;
        }

        state.loading = false;
        let outcome = match result {
            Ok(fetched) => {
                state.items = dedup_by_id(fetched);
                state.error = None;
                debug!(kind = E::KIND, token, count = state.items.len(), "refresh applied");
                RefreshOutcome::Applied {
                    count: state.items.len(),
                }
            }
            Err(err) => {
                warn!(kind = E::KIND, token, error = %err, "refresh failed");
                state.error = Some(err.user_message());
                RefreshOutcome::Failed(err)
            }
        };
        self.touch(&mut state);
        outcome
    }
}

impl<E: Entity, C: FetchAll<E>> EntityStore<E, C> {
    /// Reload the whole list from the collaborator.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(token) = self.begin_refresh() else {
            return RefreshOutcome::Cancelled;
        };
        debug!(kind = E::KIND, token, "refreshing");

        tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => {
                debug!(kind = E::KIND, token, "refresh ignored: store closed");
                RefreshOutcome::Cancelled
            }
            result = self.collaborator.fetch_all() => self.settle(token, result),
        }
    }
}

impl<E, C> EntityStore<E, C>
where
    E: Entity,
    C: FetchAll<E> + Clone + 'static,
{
    /// Refresh this store whenever one of `kinds` is emitted on `bus`.
    ///
    /// Each matching event spawns exactly one refresh on the current tokio
    /// runtime. Events emitted outside a runtime are logged and skipped.
    pub fn refresh_on(&self, bus: &EventBus, kinds: &[EventKind]) -> Subscription {
        let store = self.clone();
        bus.subscribe_to(kinds, move |event| {
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                warn!(kind = E::KIND, event = %event.kind(), "no runtime; refresh skipped");
                return;
            };
            let store = store.clone();
            debug!(kind = E::KIND, event = %event.kind(), "refresh triggered by event");
            handle.spawn(async move {
                store.refresh().await;
            });
        })
    }
}

/// Keep the first occurrence of each id.
fn dedup_by_id<E: Entity>(items: Vec<E>) -> Vec<E> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.into_iter().filter(|e| seen.insert(e.id())).collect()
}
