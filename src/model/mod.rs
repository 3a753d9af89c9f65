//! Domain entities cached by the client stores.
//!
//! Every record the backend hands out carries a unique integer id and,
//! optionally, creation and update timestamps. The [`Entity`] trait exposes
//! exactly that much to the generic store layer; the concrete structs add
//! their kind-specific fields.
//!
//! ## Example
//!
//! ```ignore
//! use evalsync::{impl_entity, Entity};
//!
//! #[derive(Serialize, Deserialize, Clone, Debug)]
//! struct Room {
//!     pub id: i64,
//!     pub name: String,
//!     pub created_at: Option<DateTime<Utc>>,
//!     pub updated_at: Option<DateTime<Utc>>,
//! }
//!
//! impl_entity!(Room, "rooms");
//! assert_eq!(Room::KIND, "rooms");
//! ```

mod classe;
mod result;
mod session;
mod student;
mod subject;
mod teacher;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

pub use classe::Classe;
pub use result::ExamResult;
pub use session::{NewSession, Session, SessionStatus, SessionUpdate};
pub use student::Student;
pub use subject::Subject;
pub use teacher::Teacher;

/// Trait for records that can be cached in an [`EntityStore`](crate::EntityStore).
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The entity kind name (e.g. "students", "sessions").
    /// Doubles as the REST collection path segment.
    const KIND: &'static str;

    /// Returns the unique identifier for this record.
    fn id(&self) -> i64;

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Implement [`Entity`] for a struct with `id`, `created_at` and `updated_at` fields.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl $crate::Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> i64 {
                self.id
            }

            fn created_at(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.created_at
            }

            fn updated_at(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.updated_at
            }
        }
    };
}
