use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student enrolled in a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// University registration number (matricule).
    #[serde(default)]
    pub student_number: Option<String>,
    #[serde(default)]
    pub classe_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

crate::impl_entity!(Student, "students");

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
