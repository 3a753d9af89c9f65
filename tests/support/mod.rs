//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use evalsync::{ExamResult, NewSession, Session, SessionStatus, Student};

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, hour, 0, 0).unwrap()
}

pub fn student(id: i64) -> Student {
    Student {
        id,
        first_name: format!("First{id}"),
        last_name: format!("Last{id}"),
        email: format!("student{id}@univ.example"),
        student_number: Some(format!("M{id:05}")),
        classe_id: Some(1),
        created_at: None,
        updated_at: None,
    }
}

pub fn session(id: i64, status: SessionStatus) -> Session {
    Session {
        id,
        quiz_id: 10 + id,
        title: Some(format!("Quiz session {id}")),
        teacher_id: Some(1),
        classe_id: Some(1),
        status,
        starts_at: at(8),
        ends_at: at(10),
        session_code: Some(format!("CODE{id}")),
        created_at: None,
        updated_at: None,
    }
}

pub fn new_session(quiz_id: i64) -> NewSession {
    NewSession {
        quiz_id,
        title: Some("Retake".into()),
        classe_id: Some(2),
        starts_at: at(14),
        ends_at: at(16),
    }
}

pub fn result(id: i64, session_id: i64, score: f64) -> ExamResult {
    ExamResult {
        id,
        session_id,
        student_id: id,
        score,
        max_score: 20.0,
        submitted_at: None,
        created_at: None,
        updated_at: None,
    }
}

/// Give spawned tasks on the current-thread test runtime time to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
