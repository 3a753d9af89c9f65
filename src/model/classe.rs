use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A class (cohort) of students. Spelled `Classe` to stay clear of the keyword-ish `Class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

crate::impl_entity!(Classe, "classes");
