//! Event Bus - decouples stores and screens.
//!
//! A status change in one entity kind (a session being cancelled) can make
//! another store (results) refresh itself without either holding a
//! reference to the other.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  emit(kind, payload)  ┌──────────────────────────┐
//! │ SessionLifecycle │ ────────────────────▶ │ EventBus                 │
//! └──────────────────┘                       │ - append to log          │
//!                                            │ - call subscribers, in   │
//!                                            │   order, same call stack │
//!                                            └────────────┬─────────────┘
//!                                                         │
//!                          ┌──────────────────────────────┼──────────────┐
//!                          ▼                              ▼              ▼
//!                  results.refresh_on(..)          dashboard screen    ...
//! ```

mod event;
mod event_bus;

pub use event::{AppEvent, EventKind};
pub use event_bus::{EventBus, Subscription};
