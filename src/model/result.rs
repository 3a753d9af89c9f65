use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student's score for one evaluation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

crate::impl_entity!(ExamResult, "results");

fn default_max_score() -> f64 {
    20.0
}

impl ExamResult {
    /// Score as a percentage of the maximum, or `None` when the maximum is zero.
    pub fn percentage(&self) -> Option<f64> {
        (self.max_score > 0.0).then(|| self.score / self.max_score * 100.0)
    }
}
