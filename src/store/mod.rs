//! Stores - client-side caches of backend entity lists.
//!
//! One [`EntityStore`] per entity kind, each bound to its own collaborator.
//! The aliases below name the instances the application uses.

mod entity_store;

use crate::model::{Classe, ExamResult, Session, Student, Subject, Teacher};

pub use entity_store::{EntityStore, RefreshOutcome};

pub type StudentStore<C> = EntityStore<Student, C>;
pub type TeacherStore<C> = EntityStore<Teacher, C>;
pub type SubjectStore<C> = EntityStore<Subject, C>;
pub type ClasseStore<C> = EntityStore<Classe, C>;
pub type SessionStore<C> = EntityStore<Session, C>;
pub type ResultStore<C> = EntityStore<ExamResult, C>;
