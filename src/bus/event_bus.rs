//! In-process publish/subscribe bus with synchronous delivery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use serde_json::Value;
use tracing::{error, trace};

use super::{AppEvent, EventKind};

type Callback = Arc<dyn Fn(&AppEvent) + Send + Sync>;

struct Registry {
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Process-wide event bus.
///
/// Features:
/// - Thread-safe (can be shared via `Clone`; clones share log and subscribers)
/// - `emit` appends to an in-memory log, then calls every subscriber
///   registered at that moment, in registration order, before returning
/// - A panicking subscriber is logged and skipped; later subscribers still
///   receive the event
/// - The log lives as long as the bus; `clear` empties it
///
/// Subscribers are called without the registry lock held, so a callback may
/// subscribe or unsubscribe; such changes apply from the next emission.
///
/// ## Example
///
/// ```
/// use evalsync::bus::{EventBus, EventKind};
/// use serde_json::json;
///
/// let bus = EventBus::new();
/// let sub = bus.subscribe(|event| println!("{} {}", event.kind(), event.payload()));
///
/// bus.emit(EventKind::SessionDeleted, json!({ "id": 4 }));
/// assert_eq!(bus.len(), 1);
///
/// sub.unsubscribe();
/// ```
#[derive(Clone)]
pub struct EventBus {
    log: Arc<RwLock<Vec<AppEvent>>>,
    registry: Arc<Mutex<Registry>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new bus with an empty log and no subscribers.
    pub fn new() -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Record an event and deliver it to every current subscriber.
    pub fn emit(&self, kind: EventKind, payload: Value) -> AppEvent {
        let event = AppEvent::new(kind, payload);
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());

        let subscribers: Vec<(u64, Callback)> = self.registry().subscribers.clone();
        trace!(kind = %kind, subscribers = subscribers.len(), "dispatching event");

        for (id, callback) in subscribers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| callback(&event)));
            if let Err(panic) = delivered {
                error!(
                    kind = %kind,
                    subscriber = id,
                    panic = panic_message(panic.as_ref()),
                    "event subscriber panicked"
                );
            }
        }

        event
    }

    /// Register a callback for every event. Dropping the returned handle
    /// does not unsubscribe; call [`Subscription::unsubscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.push((id, Arc::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a callback for events of the given kinds only.
    pub fn subscribe_to<F>(&self, kinds: &[EventKind], callback: F) -> Subscription
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let kinds = kinds.to_vec();
        self.subscribe(move |event| {
            if kinds.contains(&event.kind()) {
                callback(event);
            }
        })
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry().subscribers.len()
    }

    /// All events emitted since creation or the last `clear`.
    pub fn events(&self) -> Vec<AppEvent> {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logged events of one kind, oldest first.
    pub fn find_all_by_kind(&self, kind: EventKind) -> Vec<AppEvent> {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    /// Number of logged events.
    pub fn len(&self) -> usize {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty the event log. Subscribers stay registered.
    pub fn clear(&self) {
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a registered subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.subscribers.len();
        registry.subscribers.retain(|(id, _)| *id != self.id);
        registry.subscribers.len() != before
    }

    /// Registration id, unique within one bus.
    pub fn id(&self) -> u64 {
        self.id
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
